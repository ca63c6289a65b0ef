pub mod catalog;
pub mod company;
pub mod construction;
pub mod product;

pub use catalog::{Category, FeatureDefinition, FeatureValueRecord, Image, NewFeatureValue, NewImage};
pub use company::{Company, NewCompany};
pub use construction::{Construction, ConstructionChanges, NewConstruction};
pub use product::{NewProduct, NewVariant, Product, ProductChanges, Variant, VariantChanges};
