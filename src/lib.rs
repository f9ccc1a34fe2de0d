pub mod api;
pub mod config;
pub mod error;
pub mod logger;

pub use api::practicum::{
    ClientOptions, Course, Credentials, Endpoints, Lesson, PracticumClient, Profession,
};
pub use error::{Error, Result};
