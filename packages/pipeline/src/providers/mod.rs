//! URL builders and response models for the two external providers.

pub mod foursquare;
pub mod google;
