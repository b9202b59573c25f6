//! Kompiliertes Schema-Datenmodell: der unveränderliche Typ-Graph.
//!
//! Alle Typen hier sind das Ergebnis der Kompression eines Handler-Baums
//! (siehe [`crate::handlers`]). Einmal gebaut sind sie append-only/immutable
//! und werden über `Rc` geteilt — ein externer Schema-Cache darf sie per
//! (Target-Namespace, Dokument-URI) wiederverwenden.
//!
//! # Spec-Referenz
//!
//! - XSD 1.0 Part 1 §3.4 Complex Type Definitions
//! - XSD 1.0 Part 1 §3.8 Model Groups
//! - XSD 1.0 Part 2 §4.1 Simple Type Definition
//! - XSD 1.0 Part 2 §4.3 Constraining Facets

use std::rc::Rc;

// ============================================================================
// Occurs (XSD 1.0 Part 1 §3.9.2)
// ============================================================================

/// MaxOccurs-Constraint für Content-Model-Partikel.
///
/// `Unbounded` ist der reservierte Sentinel für `maxOccurs="unbounded"` —
/// per Konstruktion von jedem endlichen Wert unterscheidbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaxOccurs {
    /// Endliche Obergrenze.
    Bounded(usize),
    /// Unbegrenzt (`maxOccurs="unbounded"`).
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

/// Occurrence bounds shared by every content-model construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// `minOccurs`, Default 1.
    pub min: usize,
    /// `maxOccurs`, Default 1.
    pub max: MaxOccurs,
}

impl Default for Occurs {
    fn default() -> Self {
        Occurs::once()
    }
}

impl Occurs {
    /// Occurs mit den XSD-Defaults (1, 1).
    pub fn once() -> Self {
        Occurs { min: 1, max: MaxOccurs::Bounded(1) }
    }
}

// ============================================================================
// Block/Final (XSD 1.0 Part 1 §3.4.6)
// ============================================================================

/// Wert eines `block`/`final`/`blockDefault`/`finalDefault`-Attributs.
///
/// Leerer/fehlender Token ist `Default`; unbekannte Tokens sind ein Fehler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DerivationSet {
    /// Kein Token angegeben.
    #[default]
    Default,
    /// `extension`.
    Extension,
    /// `restriction`.
    Restriction,
    /// `#all`.
    All,
}

// ============================================================================
// Simple Types (XSD 1.0 Part 2)
// ============================================================================

/// Ableitungsart eines Simple Types (XSD 1.0 Part 2 §4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SimpleTypeDerivation {
    /// `xs:restriction` — Basistyp plus Facets.
    Restriction,
    /// `xs:list` — Whitespace-separierte Liste des Item-Typs.
    List,
    /// `xs:union` — einer von mehreren Member-Typen.
    Union,
}

/// Art einer Facet (XSD 1.0 Part 2 §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FacetKind {
    /// `xs:enumeration`.
    Enumeration,
    /// `xs:pattern`.
    Pattern,
    /// `xs:length`.
    Length,
    /// `xs:minLength`.
    MinLength,
    /// `xs:maxLength`.
    MaxLength,
    /// `xs:minInclusive`.
    MinInclusive,
    /// `xs:maxInclusive`.
    MaxInclusive,
    /// `xs:minExclusive`.
    MinExclusive,
    /// `xs:maxExclusive`.
    MaxExclusive,
    /// `xs:fractionDigits`.
    FractionDigits,
    /// `xs:totalDigits`.
    TotalDigits,
    /// `xs:whiteSpace`.
    WhiteSpace,
}

/// Eine Werteraum-Einschränkung eines Simple Types.
///
/// Der Wert bleibt der literale String aus dem Dokument — typspezifisches
/// Parsen/Validieren der Facet-Werte ist Sache nachgelagerter Konsumenten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    /// Facet-Art.
    pub kind: FacetKind,
    /// Literaler Attributwert.
    pub value: String,
}

/// Kompilierter Simple Type.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    /// Name (None für anonyme/inline Typen).
    pub name: Option<Rc<str>>,
    /// Target-Namespace des deklarierenden Schemas.
    pub namespace: Option<Rc<str>>,
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Ableitungsart.
    pub derivation: SimpleTypeDerivation,
    /// Eltern-Typen: Restriction-Basis, List-Item-Typ oder Union-Member.
    pub parents: Vec<Rc<SimpleType>>,
    /// Facets, in Deklarationsreihenfolge (nur bei Restriction befüllt).
    pub facets: Vec<Facet>,
    /// `final`-Maske.
    pub final_: DerivationSet,
}

// ============================================================================
// Attribute (XSD 1.0 Part 1 §3.2)
// ============================================================================

/// `use`-Maske einer Attribut-Deklaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum AttributeUse {
    /// `optional` (Default).
    #[default]
    Optional,
    /// `prohibited`.
    Prohibited,
    /// `required`.
    Required,
}

/// Kompilierte Attribut-Deklaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attributname.
    pub name: Option<Rc<str>>,
    /// Target-Namespace des deklarierenden Schemas.
    pub namespace: Option<Rc<str>>,
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Referenzierter Simple Type (None wenn weder `type` noch inline Typ).
    pub simple_type: Option<Rc<SimpleType>>,
    /// `use`-Maske.
    pub use_: AttributeUse,
    /// `default`-Wert.
    pub default: Option<String>,
    /// `fixed`-Wert.
    pub fixed: Option<String>,
    /// `form="qualified"`.
    pub form_qualified: bool,
}

/// Kompilierte Attributgruppe: deduplizierte Attribut-Menge plus
/// `anyAttribute`-Namespace-Wildcard.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroup {
    /// Gruppenname.
    pub name: Option<Rc<str>>,
    /// Target-Namespace des deklarierenden Schemas.
    pub namespace: Option<Rc<str>>,
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Namespace-Constraint des `anyAttribute`-Kindes (None wenn keines).
    pub any_attribute_namespace: Option<String>,
    /// Aggregierte Attribute.
    pub attributes: Vec<Rc<Attribute>>,
}

// ============================================================================
// Content Model (XSD 1.0 Part 1 §3.8, §3.9)
// ============================================================================

/// `processContents` eines Wildcards (XSD 1.0 Part 1 §3.10.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// `strict` (Default).
    #[default]
    Strict,
    /// `lax`.
    Lax,
    /// `skip`.
    Skip,
}

/// Kompiliertes `xs:any`-Wildcard.
#[derive(Debug, Clone, PartialEq)]
pub struct Any {
    /// `id`-Attribut.
    pub id: Option<String>,
    /// `namespace`-Constraint (Default `##any`).
    pub namespace: String,
    /// `processContents`.
    pub process: ProcessContents,
    /// Occurrence bounds.
    pub occurs: Occurs,
}

/// Kompilierte `xs:sequence`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Occurrence bounds.
    pub occurs: Occurs,
    /// Kinder in Dokumentreihenfolge.
    pub children: Vec<ElementGrouping>,
}

/// Kompilierte `xs:choice`.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Occurrence bounds.
    pub occurs: Occurs,
    /// Alternativen in Dokumentreihenfolge.
    pub children: Vec<ElementGrouping>,
}

/// Kompiliertes `xs:all`.
#[derive(Debug, Clone, PartialEq)]
pub struct All {
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Occurrence bounds.
    pub occurs: Occurs,
    /// Element-Kinder (all erlaubt nur Elemente).
    pub elements: Vec<Rc<Element>>,
}

/// Kompilierte benannte Gruppe (`xs:group`).
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Gruppenname.
    pub name: Option<Rc<str>>,
    /// Target-Namespace des deklarierenden Schemas.
    pub namespace: Option<Rc<str>>,
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Occurrence bounds.
    pub occurs: Occurs,
    /// Das eine all/choice/sequence-Kind.
    pub child: Option<Box<ElementGrouping>>,
}

/// Kompilierte Element-Deklaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Elementname.
    pub name: Option<Rc<str>>,
    /// Target-Namespace des deklarierenden Schemas.
    pub namespace: Option<Rc<str>>,
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Typ des Elements (None wenn unaufgelöst deklariert).
    pub type_: Option<Type>,
    /// Occurrence bounds.
    pub occurs: Occurs,
    /// `abstract`-Flag.
    pub abstract_: bool,
    /// `nillable`-Flag.
    pub nillable: bool,
    /// `default`-Wert.
    pub default: Option<String>,
    /// `fixed`-Wert.
    pub fixed: Option<String>,
    /// `form="qualified"`.
    pub form_qualified: bool,
    /// `block`-Maske.
    pub block: DerivationSet,
    /// `final`-Maske.
    pub final_: DerivationSet,
    /// Aufgelöste `substitutionGroup`-Referenz.
    pub substitution_group: Option<Rc<Element>>,
}

/// Summe über die Content-Model-Konstrukte.
///
/// Ersetzt die `getGrouping()`-Integer-Konstanten der Vorlage durch einen
/// erschöpfend gematchten Summentyp.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementGrouping {
    /// Einzelne Element-Deklaration.
    Element(Rc<Element>),
    /// Referenz auf/Deklaration einer benannten Gruppe.
    Group(Rc<Group>),
    /// `xs:choice`.
    Choice(Rc<Choice>),
    /// `xs:sequence`.
    Sequence(Rc<Sequence>),
    /// `xs:all`.
    All(Rc<All>),
    /// `xs:any`-Wildcard.
    Any(Rc<Any>),
}

impl ElementGrouping {
    /// Occurrence bounds des Konstrukts.
    pub fn occurs(&self) -> Occurs {
        match self {
            ElementGrouping::Element(e) => e.occurs,
            ElementGrouping::Group(g) => g.occurs,
            ElementGrouping::Choice(c) => c.occurs,
            ElementGrouping::Sequence(s) => s.occurs,
            ElementGrouping::All(a) => a.occurs,
            ElementGrouping::Any(a) => a.occurs,
        }
    }

    /// Rekursive Suche nach einer Element-Deklaration per local-name.
    ///
    /// Wird sowohl während der Kompression (Extension-Basis-Auflösung) als
    /// auch von nachgelagerten Content-Validatoren benutzt.
    pub fn find_child_element(&self, name: &str) -> Option<Rc<Element>> {
        match self {
            ElementGrouping::Element(e) => match &e.name {
                Some(n) if n.eq_ignore_ascii_case(name) => Some(Rc::clone(e)),
                _ => None,
            },
            ElementGrouping::Group(g) => {
                g.child.as_ref().and_then(|c| c.find_child_element(name))
            }
            ElementGrouping::Choice(c) => {
                c.children.iter().find_map(|c| c.find_child_element(name))
            }
            ElementGrouping::Sequence(s) => {
                s.children.iter().find_map(|c| c.find_child_element(name))
            }
            ElementGrouping::All(a) => a
                .elements
                .iter()
                .find(|e| e.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
                .cloned(),
            ElementGrouping::Any(_) => None,
        }
    }

    /// Wie [`find_child_element`](Self::find_child_element), zusätzlich auf
    /// den Target-Namespace eingeschränkt.
    pub fn find_child_element_ns(&self, name: &str, namespace: &str) -> Option<Rc<Element>> {
        let matches = |e: &Rc<Element>| {
            e.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name))
                && e.namespace.as_deref().is_some_and(|ns| ns == namespace)
        };
        match self {
            ElementGrouping::Element(e) => matches(e).then(|| Rc::clone(e)),
            ElementGrouping::Group(g) => {
                g.child.as_ref().and_then(|c| c.find_child_element_ns(name, namespace))
            }
            ElementGrouping::Choice(c) => {
                c.children.iter().find_map(|c| c.find_child_element_ns(name, namespace))
            }
            ElementGrouping::Sequence(s) => {
                s.children.iter().find_map(|c| c.find_child_element_ns(name, namespace))
            }
            ElementGrouping::All(a) => a.elements.iter().find(|e| matches(e)).cloned(),
            ElementGrouping::Any(_) => None,
        }
    }

    /// Alle Element-Deklarationen unterhalb dieses Knotens, dokumentgeordnet.
    pub fn child_elements(&self) -> Vec<Rc<Element>> {
        match self {
            ElementGrouping::Element(e) => vec![Rc::clone(e)],
            ElementGrouping::Group(g) => {
                g.child.as_ref().map(|c| c.child_elements()).unwrap_or_default()
            }
            ElementGrouping::Choice(c) => {
                c.children.iter().flat_map(|c| c.child_elements()).collect()
            }
            ElementGrouping::Sequence(s) => {
                s.children.iter().flat_map(|c| c.child_elements()).collect()
            }
            ElementGrouping::All(a) => a.elements.to_vec(),
            ElementGrouping::Any(_) => Vec::new(),
        }
    }
}

// ============================================================================
// Types (XSD 1.0 Part 1 §3.4 / Part 2 §4.1)
// ============================================================================

/// Summe über Simple und Complex Types.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Simple Type Definition.
    Simple(Rc<SimpleType>),
    /// Complex Type Definition.
    Complex(Rc<ComplexType>),
}

impl Type {
    /// Name des Typs (None für anonyme Typen).
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Simple(s) => s.name.as_deref(),
            Type::Complex(c) => c.name.as_deref(),
        }
    }

    /// Target-Namespace des deklarierenden Schemas.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Type::Simple(s) => s.namespace.as_deref(),
            Type::Complex(c) => c.namespace.as_deref(),
        }
    }
}

/// Kompilierter Complex Type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    /// Typname (None für anonyme/inline Typen).
    pub name: Option<Rc<str>>,
    /// Target-Namespace des deklarierenden Schemas.
    pub namespace: Option<Rc<str>>,
    /// `id`-Attribut.
    pub id: Option<String>,
    /// Basis-Typ bei Extension/Restriction.
    pub parent: Option<Type>,
    /// Content-Model-Kind.
    pub child: Option<ElementGrouping>,
    /// Kompilierte Attribute (Basis ∪ eigene bei Extension).
    pub attributes: Vec<Rc<Attribute>>,
    /// Namespace-Constraint eines `anyAttribute`-Kindes.
    pub any_attribute_namespace: Option<String>,
    /// `abstract`-Flag.
    pub abstract_: bool,
    /// `mixed`-Flag (bei simpleContent immer gesetzt).
    pub mixed: bool,
    /// Durch Extension/Restriction abgeleitet.
    pub derived: bool,
    /// simpleContent-Typ (Parent ist ein Simple Type).
    pub simple: bool,
    /// `block`-Maske.
    pub block: DerivationSet,
    /// `final`-Maske.
    pub final_: DerivationSet,
}

impl ComplexType {
    /// Sucht eine Element-Deklaration im Content-Model; fällt auf den
    /// Basis-Typ zurück wenn lokal nichts gefunden wird.
    pub fn find_child_element(&self, name: &str) -> Option<Rc<Element>> {
        if let Some(e) = self.child.as_ref().and_then(|c| c.find_child_element(name)) {
            return Some(e);
        }
        match &self.parent {
            Some(Type::Complex(p)) => p.find_child_element(name),
            _ => None,
        }
    }

    /// Alle Element-Deklarationen des Content-Models.
    pub fn child_elements(&self) -> Vec<Rc<Element>> {
        self.child.as_ref().map(|c| c.child_elements()).unwrap_or_default()
    }
}

// ============================================================================
// Schema (XSD 1.0 Part 1 §3.15)
// ============================================================================

/// Das kompilierte Ergebnis für ein Schema-Dokument / einen Namespace.
///
/// Einmal kompiliert unveränderlich; innerhalb eines Resolution-Kontexts
/// eindeutig identifiziert durch Target-Namespace + Dokument-URI.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Target-Namespace-URI.
    pub target_namespace: Option<Rc<str>>,
    /// Prefix, unter dem der Target-Namespace im Dokument gebunden war.
    pub prefix: Option<String>,
    /// Dokument-URI (Auflösungsbasis für relative schemaLocations).
    pub uri: Option<String>,
    /// `id`-Attribut.
    pub id: Option<String>,
    /// `version`-Attribut.
    pub version: Option<String>,
    /// `elementFormDefault="qualified"`.
    pub element_form_default: bool,
    /// `attributeFormDefault="qualified"`.
    pub attribute_form_default: bool,
    /// `blockDefault`-Maske.
    pub block_default: DerivationSet,
    /// `finalDefault`-Maske.
    pub final_default: DerivationSet,
    /// Kompilierte Top-Level-Elemente, komparator-sortiert und dedupliziert.
    pub elements: Vec<Rc<Element>>,
    /// Kompilierte Complex Types.
    pub complex_types: Vec<Rc<ComplexType>>,
    /// Kompilierte Simple Types.
    pub simple_types: Vec<Rc<SimpleType>>,
    /// Kompilierte benannte Gruppen.
    pub groups: Vec<Rc<Group>>,
    /// Kompilierte Attributgruppen.
    pub attribute_groups: Vec<Rc<AttributeGroup>>,
    /// Kompilierte Top-Level-Attribute.
    pub attributes: Vec<Rc<Attribute>>,
    /// Importierte Schemas (transitiv durchsuchbar via `look_up_*`).
    pub imports: Vec<Rc<Schema>>,
}

impl Schema {
    /// Prüft ob dieses Schema unter der angegebenen Dokument-URI geladen wurde.
    pub fn includes_uri(&self, uri: &str) -> bool {
        self.uri.as_deref() == Some(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(name: &str) -> Rc<Element> {
        Rc::new(Element {
            name: Some(Rc::from(name)),
            namespace: Some(Rc::from("http://example.org")),
            id: None,
            type_: None,
            occurs: Occurs::once(),
            abstract_: false,
            nillable: false,
            default: None,
            fixed: None,
            form_qualified: false,
            block: DerivationSet::Default,
            final_: DerivationSet::Default,
            substitution_group: None,
        })
    }

    /// Der Unbounded-Sentinel ist von jedem endlichen Wert unterscheidbar.
    #[test]
    fn unbounded_sentinel_is_distinct() {
        assert_ne!(MaxOccurs::Unbounded, MaxOccurs::Bounded(1));
        assert_ne!(MaxOccurs::Unbounded, MaxOccurs::Bounded(usize::MAX));
        assert_eq!(MaxOccurs::Unbounded, MaxOccurs::Unbounded);
    }

    /// find_child_element steigt rekursiv durch verschachtelte Gruppierungen.
    #[test]
    fn find_child_element_recurses() {
        let seq = ElementGrouping::Sequence(Rc::new(Sequence {
            id: None,
            occurs: Occurs::once(),
            children: vec![
                ElementGrouping::Element(elem("a")),
                ElementGrouping::Choice(Rc::new(Choice {
                    id: None,
                    occurs: Occurs::once(),
                    children: vec![ElementGrouping::Element(elem("b"))],
                })),
            ],
        }));

        assert!(seq.find_child_element("b").is_some());
        assert!(seq.find_child_element("missing").is_none());
    }

    /// ComplexType.find_child_element fällt auf den Basis-Typ zurück.
    #[test]
    fn complex_type_falls_back_to_parent() {
        let base = Rc::new(ComplexType {
            name: Some(Rc::from("Base")),
            namespace: None,
            id: None,
            parent: None,
            child: Some(ElementGrouping::Element(elem("inherited"))),
            attributes: vec![],
            any_attribute_namespace: None,
            abstract_: false,
            mixed: false,
            derived: false,
            simple: false,
            block: DerivationSet::Default,
            final_: DerivationSet::Default,
        });
        let derived = ComplexType {
            name: Some(Rc::from("Derived")),
            namespace: None,
            id: None,
            parent: Some(Type::Complex(base)),
            child: None,
            attributes: vec![],
            any_attribute_namespace: None,
            abstract_: false,
            mixed: false,
            derived: true,
            simple: false,
            block: DerivationSet::Default,
            final_: DerivationSet::Default,
        };

        assert!(derived.find_child_element("inherited").is_some());
    }
}
