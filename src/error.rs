//! Central error types for the XSD compiler.
//!
//! Variants reference the relevant section of the W3C XML Schema 1.0
//! specification (Part 1: Structures / Part 2: Datatypes) where one applies.
//!
//! Es gibt keine lokale Recovery: ein Schema-Dokument kompiliert entweder
//! vollständig oder die gesamte Kompilierung schlägt mit genau einem Fehler
//! fehl.

use core::fmt;

/// All error conditions raised during parsing and compression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The underlying XML document is not well-formed.
    XmlParse(String),
    /// The document root is not an `xsd:schema` element.
    NotASchema(String),
    /// A construct has more children of a given kind than the XSD grammar
    /// permits (XSD 1.0 Part 1 §3.4.2, §3.14.2).
    ///
    /// Z.B. darf `extension` höchstens eines von `{all, choice, group,
    /// sequence}` enthalten.
    DuplicateChild {
        /// Local name of the parent construct.
        parent: &'static str,
        /// Local name of the offending child.
        child: String,
    },
    /// An enumerated attribute carries a token outside its value space
    /// (`block`, `final`, `use`, `processContents`).
    UnknownAttributeValue {
        /// Attribute name.
        attribute: &'static str,
        /// The offending token.
        value: String,
    },
    /// `minOccurs`/`maxOccurs` is non-empty but not a base-10 integer
    /// (and, for `maxOccurs`, not the literal `unbounded`).
    InvalidOccurs {
        /// Attribute name.
        attribute: &'static str,
        /// The offending value.
        value: String,
    },
    /// A `ref=` lookup for an attribute, attributeGroup, element or group
    /// found no declaration (XSD 1.0 Part 1 §3.3.3).
    ReferenceNotFound {
        /// Construct kind ("attribute", "attributeGroup", "element", "group").
        kind: &'static str,
        /// The referenced qualified name.
        name: String,
    },
    /// A `base=` lookup for a complex/simple type found no declaration.
    ///
    /// Härtung: die Quell-Implementierung tolerierte hier `null` und lief in
    /// eine spätere Null-Dereferenzierung.
    TypeNotFound(String),
    /// Eine Deklaration trägt `ref` und `name` oder `ref` und `type`
    /// zugleich (XSD 1.0 Part 1 §3.3.3 src-element).
    ConflictingDeclaration {
        /// Deklarierter bzw. referenzierter Name für die Meldung.
        name: String,
        /// Welches Attributpaar kollidiert.
        detail: &'static str,
    },
    /// A compiled complex type is neither abstract nor simple and has no
    /// content model child.
    MissingContent {
        /// Type name ("(anonymous)" when absent).
        type_name: String,
        /// Target namespace of the declaring schema.
        namespace: String,
    },
    /// A simple-content complex type compiled without a base type.
    MissingBase(String),
    /// `xs:import` names the document's own target namespace
    /// (XSD 1.0 Part 1 §4.2.3).
    SelfImport(String),
    /// An in-document reference chain revisits a handler whose compression is
    /// still in progress.
    ///
    /// Härtung: die Quell-Implementierung rekursierte hier unbegrenzt.
    CircularReference(String),
    /// A `namespace`/`schemaLocation` attribute value is not a legal URI
    /// reference.
    InvalidUri(String),
    /// The schema-resolution collaborator failed (I/O, nested parse).
    Resolver(String),
    /// The input document exceeds the size bound.
    DocumentTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Allowed maximum in bytes.
        max: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XmlParse(msg) => write!(f, "XML parse error: {msg}"),
            Self::NotASchema(local) => {
                write!(f, "document root '{local}' is not an XSD schema element")
            }
            Self::DuplicateChild { parent, child } => {
                write!(f, "{parent} may only have one '{child}' child declaration")
            }
            Self::UnknownAttributeValue { attribute, value } => {
                write!(f, "unknown {attribute} value: '{value}'")
            }
            Self::InvalidOccurs { attribute, value } => {
                write!(f, "{attribute} value '{value}' is not an integer")
            }
            Self::ReferenceNotFound { kind, name } => {
                write!(f, "{kind} reference '{name}' could not be resolved")
            }
            Self::TypeNotFound(name) => write!(f, "type '{name}' not found"),
            Self::ConflictingDeclaration { name, detail } => {
                write!(f, "declaration '{name}' carries conflicting attributes ({detail})")
            }
            Self::MissingContent { type_name, namespace } => {
                write!(f, "{type_name} :: {namespace} should have a real child")
            }
            Self::MissingBase(type_name) => {
                write!(f, "{type_name} should have a real parent type")
            }
            Self::SelfImport(ns) => {
                write!(f, "import of the document's own target namespace '{ns}'")
            }
            Self::CircularReference(name) => {
                write!(f, "circular reference while compressing '{name}'")
            }
            Self::InvalidUri(value) => write!(f, "malformed URI reference: '{value}'"),
            Self::Resolver(msg) => write!(f, "schema resolution failed: {msg}"),
            Self::DocumentTooLarge { size, max } => {
                write!(f, "schema document of {size} bytes exceeds the {max} byte bound")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e.to_string())
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Display-Strings müssen den betroffenen Namen/Wert enthalten.
    #[test]
    fn reference_not_found_display() {
        let e = Error::ReferenceNotFound { kind: "element", name: "gml:pos".into() };
        let msg = e.to_string();
        assert!(msg.contains("element"), "{msg}");
        assert!(msg.contains("gml:pos"), "{msg}");
    }

    #[test]
    fn unknown_attribute_value_display() {
        let e = Error::UnknownAttributeValue { attribute: "block", value: "sealed".into() };
        assert!(e.to_string().contains("sealed"));
    }

    #[test]
    fn self_import_display() {
        let e = Error::SelfImport("http://example.org".into());
        assert!(e.to_string().contains("http://example.org"));
    }
}
