pub mod distance_matrix;
pub mod proxy;
pub mod request;
pub mod runtime;
