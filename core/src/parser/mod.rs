pub mod languages;
pub mod serialize;
pub mod tree;
pub mod types;
pub mod walk;

#[cfg(test)]
mod tests;


