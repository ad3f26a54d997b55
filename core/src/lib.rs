pub mod mealdb;
pub mod models;
pub mod service;
pub mod storage;
pub mod store;
pub mod theme;
