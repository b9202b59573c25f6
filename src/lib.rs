//! xsdgraph – XML Schema (XSD 1.0) Parser und Typ-Graph-Compiler
//!
//! Konsumiert einen SAX-artigen Event-Stream eines XSD-Dokuments, baut daraus
//! einen mutablen Handler-Baum und *komprimiert* diesen anschließend zu einem
//! unveränderlichen, kreuzreferenzierten Typ-Graphen ([`Schema`]).
//!
//! Die Kompression löst `ref=`/`base=`-Indirektion auf, merged
//! Extension/Restriction-Hierarchien und folgt `xs:import`/`xs:include`
//! transitiv über einen [`SchemaResolver`] – mit Cycle-Guards für
//! zirkulär importierende Schema-Mengen.
//!
//! # Beispiel
//!
//! ```
//! use xsdgraph::{parse_schema_str, NoopResolver};
//!
//! let xsd = r#"
//!     <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
//!                targetNamespace="http://example.org">
//!         <xs:element name="root" type="xs:string"/>
//!     </xs:schema>
//! "#;
//!
//! let schema = parse_schema_str(xsd, None, &NoopResolver).unwrap();
//! assert_eq!(schema.elements.len(), 1);
//! ```

pub mod builtins;
pub mod comparator;
pub mod error;
pub mod handlers;
pub mod qname;
pub mod reader;
pub mod resolver;
pub mod schema;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent — für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// HashSet mit ahash.
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

// Public API: kompilierter Typ-Graph
pub use schema::{
    All, Any, Attribute, AttributeGroup, AttributeUse, Choice, ComplexType, DerivationSet,
    Element, ElementGrouping, Facet, FacetKind, Group, MaxOccurs, Occurs, ProcessContents, Schema,
    Sequence, SimpleType, SimpleTypeDerivation, Type,
};

// Public API: Parse-Einstiege
pub use reader::{parse_schema_reader, parse_schema_str};

// Public API: Resolver-Kollaborateur
pub use resolver::{FileResolver, NoopResolver, SchemaResolver};

/// XML Schema Namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
