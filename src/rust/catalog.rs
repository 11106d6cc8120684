//! The fixed set of objects the classifier can recognize and where each one goes.
//!
//! Each entry pairs an English phrase (what CLIP is asked to match) with the
//! Spanish name shown to the user, the color of the disposal container, and
//! a category message. The order of entries is the order the phrases are
//! scored in, so it also decides which label wins an exact tie.

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Color code of a disposal container.
///
/// `None` marks objects that must not go into any container at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerColor {
    Green,
    White,
    Red,
    Black,
    None,
}

impl ContainerColor {
    pub const ALL: [ContainerColor; 5] = [
        ContainerColor::Green,
        ContainerColor::White,
        ContainerColor::Red,
        ContainerColor::Black,
        ContainerColor::None,
    ];

    /// Colors of the physical containers found at a collection point
    pub const BINS: [ContainerColor; 4] = [
        ContainerColor::Green,
        ContainerColor::White,
        ContainerColor::Black,
        ContainerColor::Red,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::White => "white",
            Self::Red => "red",
            Self::Black => "black",
            Self::None => "none",
        }
    }

    /// Name of the color as shown to users
    pub fn spanish_name(&self) -> &'static str {
        match self {
            Self::Green => "Verde",
            Self::White => "Blanco",
            Self::Red => "Rojo",
            Self::Black => "Negro",
            Self::None => "Ninguno",
        }
    }

    pub fn is_disposable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ContainerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    /// English phrase matched against the image
    pub phrase: String,
    /// Localized object name
    pub display_name: String,
    pub color: ContainerColor,
    /// Waste category, or a warning for objects with no container
    pub category: String,
}

impl CatalogEntry {
    pub fn new(
        phrase: impl Into<String>,
        display_name: impl Into<String>,
        color: ContainerColor,
        category: impl Into<String>,
    ) -> Self {
        Self {
            phrase: phrase.into(),
            display_name: display_name.into(),
            color,
            category: category.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Catalog phrase cannot be empty")]
    EmptyPhrase,
    #[error("Duplicate catalog phrase: {0}")]
    DuplicatePhrase(String),
    #[error("Entry '{0}' has an empty display name")]
    EmptyDisplayName(String),
    #[error("Entry '{0}' has an empty category")]
    EmptyCategory(String),
    #[error("Catalog must contain at least one entry")]
    Empty,
}

/// Immutable, ordered lookup table from phrase to catalog entry.
#[derive(Debug, Clone)]
pub struct LabelCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

const ORGANIC: &str = "Residuo orgánico";
const RECYCLABLE: &str = "Material reciclable";
const HAZARDOUS: &str = "Residuo peligroso";
const NON_RECOVERABLE: &str = "Basura no aprovechable";
const E_WASTE: &str = "Residuo electrónico (RAEE). Busca un punto especial.";

const BUILTIN_ENTRIES: &[(&str, &str, ContainerColor, &str)] = &[
    // Organic
    ("banana peel", "Cáscara de banano", ContainerColor::Green, ORGANIC),
    ("apple core", "Corazón de manzana", ContainerColor::Green, ORGANIC),
    ("food scraps", "Sobras de comida", ContainerColor::Green, ORGANIC),
    ("vegetables", "Vegetales", ContainerColor::Green, ORGANIC),
    ("fruit", "Fruta", ContainerColor::Green, ORGANIC),
    ("bread", "Pan", ContainerColor::Green, ORGANIC),
    ("leaves", "Hojas secas", ContainerColor::Green, ORGANIC),
    ("flowers", "Flores", ContainerColor::Green, ORGANIC),
    ("meat", "Carne", ContainerColor::Green, ORGANIC),
    ("chicken bones", "Huesos de pollo", ContainerColor::Green, ORGANIC),
    // Recyclable
    ("plastic bottle", "Botella de plástico", ContainerColor::White, RECYCLABLE),
    ("glass bottle", "Botella de vidrio", ContainerColor::White, RECYCLABLE),
    ("cardboard box", "Caja de cartón", ContainerColor::White, RECYCLABLE),
    ("paper", "Papel", ContainerColor::White, RECYCLABLE),
    ("newspaper", "Periódico", ContainerColor::White, RECYCLABLE),
    ("soda can", "Lata de refresco", ContainerColor::White, RECYCLABLE),
    ("notebook", "Cuaderno", ContainerColor::White, RECYCLABLE),
    ("clean plastic bag", "Bolsa plástica limpia", ContainerColor::White, RECYCLABLE),
    // Hazardous
    ("battery", "Batería / Pila", ContainerColor::Red, HAZARDOUS),
    ("medical syringe", "Jeringa médica", ContainerColor::Red, HAZARDOUS),
    ("pills", "Pastillas / Medicamentos", ContainerColor::Red, HAZARDOUS),
    ("insecticide", "Insecticida", ContainerColor::Red, HAZARDOUS),
    ("face mask", "Tapabocas", ContainerColor::Red, HAZARDOUS),
    // Non-recoverable
    ("dirty napkin", "Servilleta sucia", ContainerColor::Black, NON_RECOVERABLE),
    ("toilet paper", "Papel higiénico", ContainerColor::Black, NON_RECOVERABLE),
    ("cigarette butt", "Colilla de cigarrillo", ContainerColor::Black, NON_RECOVERABLE),
    ("candy wrapper", "Envoltura de dulce", ContainerColor::Black, NON_RECOVERABLE),
    ("styrofoam", "Icopor", ContainerColor::Black, NON_RECOVERABLE),
    ("dirty plastic", "Plástico sucio", ContainerColor::Black, NON_RECOVERABLE),
    // Never thrown away
    ("living animal", "Animal vivo", ContainerColor::None, "¡Cuidado! Esto es un ser vivo."),
    ("cat", "Gato", ContainerColor::None, "¡Es un gato! No lo tires a la basura."),
    ("dog", "Perro", ContainerColor::None, "¡Es un perro! No lo tires a la basura."),
    ("person", "Persona", ContainerColor::None, "¡Es una persona!"),
    ("water", "Agua líquida", ContainerColor::None, "El agua no se tira aquí, vacíala en un desagüe."),
    ("mobile phone", "Teléfono celular", ContainerColor::None, E_WASTE),
    ("laptop", "Computador portátil", ContainerColor::None, E_WASTE),
];

impl LabelCatalog {
    pub fn builder() -> LabelCatalogBuilder {
        LabelCatalogBuilder::default()
    }

    /// The built-in catalog of household objects.
    pub fn builtin() -> Self {
        let entries: Vec<CatalogEntry> = BUILTIN_ENTRIES
            .iter()
            .map(|&(phrase, name, color, category)| CatalogEntry::new(phrase, name, color, category))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.phrase.clone(), i))
            .collect();
        Self { entries, index }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Phrases in scoring order
    pub fn phrases(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.phrase.as_str()).collect()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn get(&self, phrase: &str) -> Option<&CatalogEntry> {
        self.index.get(phrase).map(|&i| &self.entries[i])
    }
}

impl Default for LabelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Validating builder for custom catalogs.
#[derive(Debug, Default)]
pub struct LabelCatalogBuilder {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl LabelCatalogBuilder {
    pub fn add_entry(mut self, entry: CatalogEntry) -> Result<Self, CatalogError> {
        if entry.phrase.trim().is_empty() {
            return Err(CatalogError::EmptyPhrase);
        }
        if self.index.contains_key(&entry.phrase) {
            return Err(CatalogError::DuplicatePhrase(entry.phrase));
        }
        if entry.display_name.trim().is_empty() {
            return Err(CatalogError::EmptyDisplayName(entry.phrase));
        }
        if entry.category.trim().is_empty() {
            return Err(CatalogError::EmptyCategory(entry.phrase));
        }
        self.index.insert(entry.phrase.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(self)
    }

    pub fn build(self) -> Result<LabelCatalog, CatalogError> {
        if self.entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(LabelCatalog {
            entries: self.entries,
            index: self.index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_is_valid() {
        let catalog = LabelCatalog::builtin();
        assert_eq!(catalog.len(), 36);

        let unique: HashSet<&str> = catalog.phrases().into_iter().collect();
        assert_eq!(unique.len(), catalog.len());

        for entry in catalog.entries() {
            assert!(!entry.display_name.is_empty(), "{} has no name", entry.phrase);
            assert!(!entry.category.is_empty());
            assert!(ContainerColor::ALL.contains(&entry.color));
        }
    }

    #[test]
    fn test_builtin_rebuilds_through_builder() {
        let mut builder = LabelCatalog::builder();
        for entry in LabelCatalog::builtin().entries() {
            builder = builder.add_entry(entry.clone()).unwrap();
        }
        assert_eq!(builder.build().unwrap().len(), 36);
    }

    #[test]
    fn test_color_counts() {
        let catalog = LabelCatalog::builtin();
        let count = |c: ContainerColor| catalog.entries().iter().filter(|e| e.color == c).count();
        assert_eq!(count(ContainerColor::Green), 10);
        assert_eq!(count(ContainerColor::White), 8);
        assert_eq!(count(ContainerColor::Red), 5);
        assert_eq!(count(ContainerColor::Black), 6);
        assert_eq!(count(ContainerColor::None), 7);
    }

    #[test]
    fn test_lookup() {
        let catalog = LabelCatalog::builtin();
        let bottle = catalog.get("plastic bottle").unwrap();
        assert_eq!(bottle.display_name, "Botella de plástico");
        assert_eq!(bottle.color, ContainerColor::White);
        assert_eq!(catalog.entry(0).unwrap().phrase, "banana peel");
        assert!(catalog.get("spaceship").is_none());
    }

    #[test]
    fn test_builder_rejects_bad_entries() {
        let dup = LabelCatalog::builder()
            .add_entry(CatalogEntry::new("cat", "Gato", ContainerColor::None, "x"))
            .unwrap()
            .add_entry(CatalogEntry::new("cat", "Gato 2", ContainerColor::None, "y"));
        assert_eq!(dup.unwrap_err(), CatalogError::DuplicatePhrase("cat".into()));

        let empty_name = LabelCatalog::builder()
            .add_entry(CatalogEntry::new("cat", "  ", ContainerColor::None, "x"));
        assert!(matches!(empty_name, Err(CatalogError::EmptyDisplayName(_))));

        let empty_phrase = LabelCatalog::builder()
            .add_entry(CatalogEntry::new("", "Gato", ContainerColor::None, "x"));
        assert!(matches!(empty_phrase, Err(CatalogError::EmptyPhrase)));

        assert_eq!(LabelCatalog::builder().build().unwrap_err(), CatalogError::Empty);
    }

    #[test]
    fn test_color_serialization() {
        assert_eq!(serde_json::to_string(&ContainerColor::White).unwrap(), "\"white\"");
        assert_eq!(serde_json::to_string(&ContainerColor::None).unwrap(), "\"none\"");
        assert_eq!(ContainerColor::Black.spanish_name(), "Negro");
        assert!(!ContainerColor::None.is_disposable());
    }
}
