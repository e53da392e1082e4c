use super::ApiError;

pub fn validate_id(kind: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {kind} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation("Invalid page: pages start at 1"));
    }
    Ok(page)
}

pub fn validate_page_size(page_size: u64, max: u64) -> Result<u64, ApiError> {
    if !(1..=max).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "Invalid page size: {page_size}. Page size must be between 1 and {max}"
        )));
    }
    Ok(page_size)
}
