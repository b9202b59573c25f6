//! Strukturelle Totalordnung über kompilierte Graph-Knoten.
//!
//! Ausschließlich für die Deduplizierung von Deklarationen gedacht, die beim
//! Mergen von `include`-Schemas (gleicher Target-Namespace, potentiell
//! überlappende Deklarationen) zusammenkommen.
//!
//! # Warnung
//!
//! Dieser Vergleich ist NICHT für allgemeine Zwecke geeignet. Er ist nur für
//! frisch kompilierte, vollständig aufgelöste Werte korrekt — niemals für
//! Platzhalter oder in Arbeit befindliche Knoten. Ein Vergleich von
//! Platzhaltern könnte beim Deduplizieren stillschweigend Deklarationen
//! verlieren.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::schema::{
    Attribute, AttributeGroup, ComplexType, Element, ElementGrouping, Facet, Group, MaxOccurs,
    Occurs, Schema, SimpleType, Type,
};

/// Namespaced-Vergleiche über kompilierte Knoten, ein `compare_*` pro Art.
pub struct SchemaComparator;

/// `None` sortiert NACH `Some` (Platzhalter-Namen ans Ende).
fn cmp_opt_str(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

fn cmp_occurs(a: Occurs, b: Occurs) -> Ordering {
    let max_rank = |m: MaxOccurs| match m {
        MaxOccurs::Bounded(n) => (0u8, n),
        MaxOccurs::Unbounded => (1u8, 0),
    };
    max_rank(a.max).cmp(&max_rank(b.max)).then(a.min.cmp(&b.min))
}

/// Rang der Content-Model-Art für den Vergleich ungleichartiger Knoten.
fn grouping_rank(g: &ElementGrouping) -> u8 {
    match g {
        ElementGrouping::Element(_) => 1,
        ElementGrouping::Group(_) => 2,
        ElementGrouping::Choice(_) => 3,
        ElementGrouping::Sequence(_) => 4,
        ElementGrouping::All(_) => 5,
        ElementGrouping::Any(_) => 6,
    }
}

fn cmp_sorted_by<T, F>(a: &[Rc<T>], b: &[Rc<T>], cmp: F) -> Ordering
where
    F: Fn(&T, &T) -> Ordering + Copy,
{
    if a.len() != b.len() {
        return a.len().cmp(&b.len());
    }
    let mut sa: Vec<&Rc<T>> = a.iter().collect();
    let mut sb: Vec<&Rc<T>> = b.iter().collect();
    sa.sort_by(|x, y| cmp(x, y));
    sb.sort_by(|x, y| cmp(x, y));
    for (x, y) in sa.iter().zip(sb.iter()) {
        let o = cmp(x, y);
        if o != Ordering::Equal {
            return o;
        }
    }
    Ordering::Equal
}

impl SchemaComparator {
    /// Attribut: Name, Namespace, use-Maske, dann Simple-Type-Vergleich.
    pub fn compare_attribute(a: &Attribute, b: &Attribute) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        cmp_opt_str(a.name.as_deref(), b.name.as_deref())
            .then_with(|| cmp_opt_str(a.namespace.as_deref(), b.namespace.as_deref()))
            .then_with(|| a.use_.cmp(&b.use_))
            .then_with(|| match (&a.simple_type, &b.simple_type) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => Self::compare_simple_type(x, y),
            })
    }

    /// Attributgruppe: Name, Namespace, anyAttribute-Namespace, sortierte
    /// Attribut-Arrays.
    pub fn compare_attribute_group(a: &AttributeGroup, b: &AttributeGroup) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        cmp_opt_str(a.name.as_deref(), b.name.as_deref())
            .then_with(|| cmp_opt_str(a.namespace.as_deref(), b.namespace.as_deref()))
            .then_with(|| {
                cmp_opt_str(a.any_attribute_namespace.as_deref(), b.any_attribute_namespace.as_deref())
            })
            .then_with(|| cmp_sorted_by(&a.attributes, &b.attributes, Self::compare_attribute))
    }

    /// Gruppe: Name, Namespace, Occurs, dann Kind-Vergleich.
    pub fn compare_group(a: &Group, b: &Group) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        cmp_opt_str(a.name.as_deref(), b.name.as_deref())
            .then_with(|| cmp_opt_str(a.namespace.as_deref(), b.namespace.as_deref()))
            .then_with(|| cmp_occurs(a.occurs, b.occurs))
            .then_with(|| match (&a.child, &b.child) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => Self::compare_grouping(x, y),
            })
    }

    /// Element: Name, Namespace, Occurs, Substitution-Group, Typ.
    pub fn compare_element(a: &Element, b: &Element) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        cmp_opt_str(a.name.as_deref(), b.name.as_deref())
            .then_with(|| cmp_opt_str(a.namespace.as_deref(), b.namespace.as_deref()))
            .then_with(|| cmp_occurs(a.occurs, b.occurs))
            .then_with(|| match (&a.substitution_group, &b.substitution_group) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => Self::compare_element(x, y),
            })
            .then_with(|| match (&a.type_, &b.type_) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => Self::compare_type(x, y),
            })
    }

    /// Content-Model-Knoten: Art, Occurs, dann rekursiv die Kinder.
    pub fn compare_grouping(a: &ElementGrouping, b: &ElementGrouping) -> Ordering {
        let rank = grouping_rank(a).cmp(&grouping_rank(b));
        if rank != Ordering::Equal {
            return rank;
        }
        let occ = cmp_occurs(a.occurs(), b.occurs());
        if occ != Ordering::Equal {
            return occ;
        }
        match (a, b) {
            (ElementGrouping::Element(x), ElementGrouping::Element(y)) => {
                Self::compare_element(x, y)
            }
            (ElementGrouping::Group(x), ElementGrouping::Group(y)) => Self::compare_group(x, y),
            (ElementGrouping::Choice(x), ElementGrouping::Choice(y)) => {
                Self::compare_children(&x.children, &y.children)
            }
            (ElementGrouping::Sequence(x), ElementGrouping::Sequence(y)) => {
                Self::compare_children(&x.children, &y.children)
            }
            (ElementGrouping::All(x), ElementGrouping::All(y)) => {
                cmp_sorted_by(&x.elements, &y.elements, Self::compare_element)
            }
            (ElementGrouping::Any(x), ElementGrouping::Any(y)) => x.namespace.cmp(&y.namespace),
            // Ränge waren gleich, Arten damit auch.
            _ => unreachable!("grouping ranks matched for different kinds"),
        }
    }

    fn compare_children(a: &[ElementGrouping], b: &[ElementGrouping]) -> Ordering {
        if a.len() != b.len() {
            return a.len().cmp(&b.len());
        }
        for (x, y) in a.iter().zip(b.iter()) {
            let o = Self::compare_grouping(x, y);
            if o != Ordering::Equal {
                return o;
            }
        }
        Ordering::Equal
    }

    /// Typ-Summe: Simple vor Complex, dann artspezifisch.
    pub fn compare_type(a: &Type, b: &Type) -> Ordering {
        match (a, b) {
            (Type::Simple(x), Type::Simple(y)) => Self::compare_simple_type(x, y),
            (Type::Complex(x), Type::Complex(y)) => Self::compare_complex_type(x, y),
            (Type::Simple(_), Type::Complex(_)) => Ordering::Less,
            (Type::Complex(_), Type::Simple(_)) => Ordering::Greater,
        }
    }

    /// Simple Type: Name, Namespace, sortierte Eltern, sortierte Facets.
    pub fn compare_simple_type(a: &SimpleType, b: &SimpleType) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        cmp_opt_str(a.name.as_deref(), b.name.as_deref())
            .then_with(|| cmp_opt_str(a.namespace.as_deref(), b.namespace.as_deref()))
            .then_with(|| cmp_sorted_by(&a.parents, &b.parents, Self::compare_simple_type))
            .then_with(|| {
                if a.facets.len() != b.facets.len() {
                    return a.facets.len().cmp(&b.facets.len());
                }
                let mut fa: Vec<&Facet> = a.facets.iter().collect();
                let mut fb: Vec<&Facet> = b.facets.iter().collect();
                fa.sort_by(|x, y| Self::compare_facet(x, y));
                fb.sort_by(|x, y| Self::compare_facet(x, y));
                for (x, y) in fa.iter().zip(fb.iter()) {
                    let o = Self::compare_facet(x, y);
                    if o != Ordering::Equal {
                        return o;
                    }
                }
                Ordering::Equal
            })
    }

    /// Facet: Art, dann literaler Wert.
    pub fn compare_facet(a: &Facet, b: &Facet) -> Ordering {
        a.kind.cmp(&b.kind).then_with(|| a.value.cmp(&b.value))
    }

    /// Complex Type: Name, Namespace, Parent-Typ, anyAttribute-Namespace,
    /// sortierte Attribute, sortierte Kind-Elemente.
    pub fn compare_complex_type(a: &ComplexType, b: &ComplexType) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        cmp_opt_str(a.name.as_deref(), b.name.as_deref())
            .then_with(|| cmp_opt_str(a.namespace.as_deref(), b.namespace.as_deref()))
            .then_with(|| match (&a.parent, &b.parent) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => Self::compare_type(x, y),
            })
            .then_with(|| {
                cmp_opt_str(a.any_attribute_namespace.as_deref(), b.any_attribute_namespace.as_deref())
            })
            .then_with(|| cmp_sorted_by(&a.attributes, &b.attributes, Self::compare_attribute))
            .then_with(|| {
                let ea = a.child_elements();
                let eb = b.child_elements();
                cmp_sorted_by(&ea, &eb, Self::compare_element)
            })
    }

    /// Import: Target-Namespace, Dokument-URI, dann Deklarations-Zählungen.
    pub fn compare_import(a: &Schema, b: &Schema) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        cmp_opt_str(a.target_namespace.as_deref(), b.target_namespace.as_deref())
            .then_with(|| cmp_opt_str(a.uri.as_deref(), b.uri.as_deref()))
            .then_with(|| a.elements.len().cmp(&b.elements.len()))
            .then_with(|| a.complex_types.len().cmp(&b.complex_types.len()))
            .then_with(|| a.simple_types.len().cmp(&b.simple_types.len()))
            .then_with(|| a.attributes.len().cmp(&b.attributes.len()))
            .then_with(|| a.attribute_groups.len().cmp(&b.attribute_groups.len()))
            .then_with(|| a.groups.len().cmp(&b.groups.len()))
    }
}

/// Sortiert per Komparator und verwirft benachbarte strukturgleiche Duplikate.
///
/// Deterministische Entsprechung des TreeSet-Merges der Vorlage; nur auf
/// frisch kompilierte, vollständig aufgelöste Werte anwenden (siehe
/// Modul-Warnung).
pub fn sort_dedup<T>(mut values: Vec<Rc<T>>, cmp: fn(&T, &T) -> Ordering) -> Vec<Rc<T>> {
    values.sort_by(|a, b| cmp(a, b));
    values.dedup_by(|a, b| cmp(a, b) == Ordering::Equal);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeUse;

    fn attr(name: &str, use_: AttributeUse) -> Rc<Attribute> {
        Rc::new(Attribute {
            name: Some(Rc::from(name)),
            namespace: Some(Rc::from("http://example.org")),
            id: None,
            simple_type: crate::builtins::find("string"),
            use_,
            default: None,
            fixed: None,
            form_qualified: false,
        })
    }

    /// Strukturgleiche, objekt-verschiedene Attribute vergleichen zu Equal.
    #[test]
    fn structurally_equal_attributes_compare_equal() {
        let a = attr("srsName", AttributeUse::Optional);
        let b = attr("srsName", AttributeUse::Optional);
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(SchemaComparator::compare_attribute(&a, &b), Ordering::Equal);
    }

    /// use-Maske geht vor Simple-Type-Vergleich.
    #[test]
    fn attribute_use_orders_before_type() {
        let a = attr("srsName", AttributeUse::Optional);
        let b = attr("srsName", AttributeUse::Required);
        assert_ne!(SchemaComparator::compare_attribute(&a, &b), Ordering::Equal);
    }

    /// None-Namen sortieren ans Ende.
    #[test]
    fn none_name_sorts_last() {
        let named = attr("a", AttributeUse::Optional);
        let anon = Rc::new(Attribute { name: None, ..(*named).clone() });
        assert_eq!(SchemaComparator::compare_attribute(&named, &anon), Ordering::Less);
    }

    /// sort_dedup verwirft strukturgleiche Duplikate.
    #[test]
    fn sort_dedup_drops_duplicates() {
        let v = vec![
            attr("b", AttributeUse::Optional),
            attr("a", AttributeUse::Optional),
            attr("b", AttributeUse::Optional),
        ];
        let out = sort_dedup(v, SchemaComparator::compare_attribute);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name.as_deref(), Some("a"));
        assert_eq!(out[1].name.as_deref(), Some("b"));
    }
}
