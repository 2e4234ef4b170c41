use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Page wrapper returned by list endpoints.
#[derive(Serialize, Debug)]
pub struct Page<T> {
    pub page: u32,
    pub per_page: u32,
    pub items: Vec<T>,
}
