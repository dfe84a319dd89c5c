//! User preference record collected by the form

use std::path::{Path, PathBuf};

/// The eight free-text preference fields, in prompt order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceField {
    UseCase,
    Price,
    Economy,
    BodyType,
    Practicality,
    Technology,
    FuelType,
    Colour,
}

impl PreferenceField {
    /// Fixed rendering order
    pub const ALL: [PreferenceField; 8] = [
        Self::UseCase,
        Self::Price,
        Self::Economy,
        Self::BodyType,
        Self::Practicality,
        Self::Technology,
        Self::FuelType,
        Self::Colour,
    ];

    /// Label used in the rendered prompt line
    pub fn label(&self) -> &'static str {
        match self {
            Self::UseCase => "Use Case",
            Self::Price => "Price",
            Self::Economy => "Economy",
            Self::BodyType => "Body Type",
            Self::Practicality => "Practicality",
            Self::Technology => "Technology",
            Self::FuelType => "Fuel Type",
            Self::Colour => "Colour Options",
        }
    }

    /// Question shown to the user when filling in the form
    pub fn question(&self) -> &'static str {
        match self {
            Self::UseCase => {
                "Enter your main use case and what you are mainly looking for in your next car."
            }
            Self::Price => "Enter the price range in which you want to select your next car.",
            Self::Economy => "Enter the minimum fuel economy you wish your next car to have.",
            Self::BodyType => "Select body-type that you would like.",
            Self::Practicality => {
                "Enter how much of a priority is bootspace to you and how many people you would like your car to seat."
            }
            Self::Technology => "Enter the technology you would like to see in your car.",
            Self::FuelType => "Enter your preferred fuel type.",
            Self::Colour => "Enter your preferred first colour and second colour.",
        }
    }

    /// Example input for the field
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::UseCase => "Ex: Reliable farm vehicle, Comfortable city car.",
            Self::Price => "Enter in any currency required.",
            Self::Economy => "Preferable use km/l or mpg",
            Self::BodyType => {
                "Ex: Hatchback, Sedan, Coupe, SUV, Pick-Up, Van, Convertible, Station Wagon"
            }
            Self::Practicality => "Number of seats and bootspace required",
            Self::Technology => "Ex: Panoramic sunroof, ADAS, Air Purifier, AWD",
            Self::FuelType => "Ex: Petrol, Diesel, Hybrid, Electric, Hydrogen Fuel Cell",
            Self::Colour => "Specify colours",
        }
    }
}

/// Reference to an image on the local file system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub path: PathBuf,
}

impl ImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Preferences for one submission
///
/// Built once per submission and never mutated by the builder or the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPreferences {
    pub use_case: String,
    pub price: String,
    pub economy: String,
    pub body_type: String,
    pub practicality: String,
    pub technology: String,
    pub fuel_type: String,
    pub colour: String,
    pub image: Option<ImageSource>,
}

impl UserPreferences {
    /// Create an empty preference record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field by kind
    pub fn with_field(mut self, field: PreferenceField, value: impl Into<String>) -> Self {
        *self.field_mut(field) = value.into();
        self
    }

    pub fn with_use_case(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::UseCase, value)
    }

    pub fn with_price(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::Price, value)
    }

    pub fn with_economy(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::Economy, value)
    }

    pub fn with_body_type(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::BodyType, value)
    }

    pub fn with_practicality(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::Practicality, value)
    }

    pub fn with_technology(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::Technology, value)
    }

    pub fn with_fuel_type(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::FuelType, value)
    }

    pub fn with_colour(self, value: impl Into<String>) -> Self {
        self.with_field(PreferenceField::Colour, value)
    }

    /// Attach an image by path
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(ImageSource::new(path));
        self
    }

    /// Get the value of a field
    pub fn field(&self, field: PreferenceField) -> &str {
        match field {
            PreferenceField::UseCase => &self.use_case,
            PreferenceField::Price => &self.price,
            PreferenceField::Economy => &self.economy,
            PreferenceField::BodyType => &self.body_type,
            PreferenceField::Practicality => &self.practicality,
            PreferenceField::Technology => &self.technology,
            PreferenceField::FuelType => &self.fuel_type,
            PreferenceField::Colour => &self.colour,
        }
    }

    fn field_mut(&mut self, field: PreferenceField) -> &mut String {
        match field {
            PreferenceField::UseCase => &mut self.use_case,
            PreferenceField::Price => &mut self.price,
            PreferenceField::Economy => &mut self.economy,
            PreferenceField::BodyType => &mut self.body_type,
            PreferenceField::Practicality => &mut self.practicality,
            PreferenceField::Technology => &mut self.technology,
            PreferenceField::FuelType => &mut self.fuel_type,
            PreferenceField::Colour => &mut self.colour,
        }
    }

    /// True when no text field is filled and no image is attached
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && PreferenceField::ALL
                .iter()
                .all(|f| self.field(*f).trim().is_empty())
    }
}
