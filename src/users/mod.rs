pub mod models;
pub mod services;
pub mod sessions;
#[cfg(test)]
mod tests;
pub mod views;
