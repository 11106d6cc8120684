pub mod classification;
pub mod containers;
mod error;

pub use classification::{ClassificationResult, ClassificationService};
pub use containers::{ContainerLocator, GeoPoint, MockContainer, CITY_CENTER};
pub use error::ServiceError;
