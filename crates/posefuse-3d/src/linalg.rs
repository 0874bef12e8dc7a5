use crate::utils;

/// Error types for the linalg module.
#[derive(Debug, thiserror::Error)]
pub enum LinalgError {
    /// Source and destination buffers differ in length.
    #[error("Source and destination point buffers differ in length ({0} != {1})")]
    LengthMismatch(usize, usize),
}

/// Transform a set of points using a rotation and translation.
///
/// Computes `dst = R * src + t` for every point.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `dst_r_src` - A row-major rotation matrix.
/// * `dst_t_src` - A translation vector.
/// * `dst_points` - A pre-allocated buffer to store the transformed points.
///
/// PRECONDITION: dst_points is a pre-allocated buffer of the same size as source.
///
/// Example:
///
/// ```
/// use posefuse_3d::linalg::transform_points3d;
///
/// let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
/// let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let translation = [0.0, 0.0, 0.0];
/// let mut dst_points = vec![[0.0; 3]; src_points.len()];
/// transform_points3d(&src_points, &rotation, &translation, &mut dst_points).unwrap();
/// assert_eq!(dst_points, src_points);
/// ```
pub fn transform_points3d(
    src_points: &[[f64; 3]],
    dst_r_src: &[[f64; 3]; 3],
    dst_t_src: &[f64; 3],
    dst_points: &mut [[f64; 3]],
) -> Result<(), LinalgError> {
    if src_points.len() != dst_points.len() {
        return Err(LinalgError::LengthMismatch(
            src_points.len(),
            dst_points.len(),
        ));
    }

    if src_points.is_empty() {
        return Ok(());
    }

    // create views of the rotation and translation matrices
    let dst_r_src_mat = utils::array33_to_faer_mat33(dst_r_src);
    let dst_t_src_col = utils::array3_to_faer_col(dst_t_src);

    // Nx3 row-major view of the source points
    let points_in_src =
        faer::mat::from_row_major_slice(src_points.as_flattened(), src_points.len(), 3);

    // 3xN column-major view of the destination, each column is a point
    let num_points = dst_points.len();
    let mut points_in_dst =
        faer::mat::from_column_major_slice_mut(dst_points.as_flattened_mut(), 3, num_points);

    faer::linalg::matmul::matmul(
        points_in_dst.as_mut(),
        dst_r_src_mat,
        points_in_src.transpose(),
        None,
        1.0,
        faer::Parallelism::None,
    );

    let (tx, ty, tz) = (
        dst_t_src_col.read(0),
        dst_t_src_col.read(1),
        dst_t_src_col.read(2),
    );

    for mut col in points_in_dst.col_iter_mut() {
        col.write(0, col.read(0) + tx);
        col.write(1, col.read(1) + ty);
        col.write(2, col.read(2) + tz);
    }

    Ok(())
}
