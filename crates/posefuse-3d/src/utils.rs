/// Utility function to convert a 3D array to a faer column vector.
///
/// # Arguments
///
/// * `array` - A 3D array.
///
/// # Returns
///
/// A faer column vector.
pub fn array3_to_faer_col(array: &[f64; 3]) -> faer::ColRef<'_, f64> {
    faer::col::from_slice(array.as_slice())
}

/// Utility function to convert a 3x3 array to a faer matrix 3x3.
///
/// # Arguments
///
/// * `array` - A 3x3 array in row-major order.
///
/// # Returns
///
/// A faer matrix 3x3.
pub fn array33_to_faer_mat33(array: &[[f64; 3]; 3]) -> faer::MatRef<'_, f64> {
    faer::mat::from_row_major_slice(array.as_flattened(), 3, 3)
}

/// Determinant of a row-major 3x3 matrix.
pub fn det33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}
