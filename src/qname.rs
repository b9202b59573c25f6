//! Qualified-name splitting for reference resolution.
//!
//! Ein `ref=`/`base=`/`type=`-Wert ist ein QName der Form `prefix:local`.
//! Beim Split am ersten `:` bedeutet ein fehlender Doppelpunkt den leeren
//! Prefix `""` — dieser ist von einem vorhandenen, zufällig passenden Prefix
//! zu unterscheiden (XML Namespaces 1.0 §4).

/// Splits a qualified name into `(prefix, local_name)`.
///
/// No colon yields the empty prefix `""`.
pub fn split_qname(qname: &str) -> (&str, &str) {
    match qname.find(':') {
        Some(idx) => (&qname[..idx], &qname[idx + 1..]),
        None => ("", qname),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// QName mit Prefix wird am ersten Doppelpunkt gesplittet.
    #[test]
    fn split_prefixed() {
        assert_eq!(split_qname("gml:AbstractFeatureType"), ("gml", "AbstractFeatureType"));
    }

    /// Ohne Doppelpunkt ist der Prefix leer.
    #[test]
    fn split_unprefixed() {
        assert_eq!(split_qname("FeatureType"), ("", "FeatureType"));
    }

    /// Nur der erste Doppelpunkt trennt.
    #[test]
    fn split_first_colon_only() {
        assert_eq!(split_qname("a:b:c"), ("a", "b:c"));
    }
}
