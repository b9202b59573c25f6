//! Handler fuer das `schema`-Dokumentelement und die Kompilierung des
//! gesamten Dokuments.
//!
//! Der `SchemaHandler` ist waehrend der Kompilierung zugleich der
//! Aufloesungskontext: alle `ref=`/`type=`/`base=`-QNames der Kind-Handler
//! laufen ueber seine `look_up_*`-Methoden. Die Deklarationslisten halten
//! deshalb beides, rohe Handler und bereits kompilierte Knoten — per
//! `include` uebernommene Deklarationen kommen fertig kompiliert an.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::builtins;
use crate::comparator::{sort_dedup, SchemaComparator};
use crate::error::{Error, Result};
use crate::handlers::{
    att, att_raw, parse_derivation, Handler,
};
use crate::handlers::{
    AttributeGroupHandler, AttributeHandler, ComplexTypeHandler, ElementHandler, GroupHandler,
    ImportHandler, IncludeHandler, RedefineHandler, SimpleTypeHandler,
};
use crate::qname::split_qname;
use crate::reader::ElementAttributes;
use crate::resolver::SchemaResolver;
use crate::schema::{
    Attribute, AttributeGroup, ComplexType, DerivationSet, Element, Group, Schema, SimpleType,
    Type,
};
use crate::{FastHashMap, FastHashSet};

/// Eintrag einer Deklarationsliste: roher Handler oder fertiger Knoten.
pub(crate) enum Entry<H, T> {
    Raw(H),
    Done(Rc<T>),
}

pub struct SchemaHandler {
    id: Option<String>,
    version: Option<String>,
    target_namespace: Option<Rc<str>>,
    prefix: Option<String>,
    element_form_default: bool,
    attribute_form_default: bool,
    block_default: DerivationSet,
    final_default: DerivationSet,
    // Namespace-URI → Prefix, aus den xmlns-Deklarationen des Dokuments
    prefix_cache: RefCell<FastHashMap<String, String>>,
    includes: Vec<IncludeHandler>,
    import_handlers: Vec<ImportHandler>,
    redefines: Vec<RedefineHandler>,
    simple_types: RefCell<Vec<Entry<SimpleTypeHandler, SimpleType>>>,
    complex_types: RefCell<Vec<Entry<ComplexTypeHandler, ComplexType>>>,
    elements: RefCell<Vec<Entry<ElementHandler, Element>>>,
    groups: RefCell<Vec<Entry<GroupHandler, Group>>>,
    attribute_groups: RefCell<Vec<Entry<AttributeGroupHandler, AttributeGroup>>>,
    attributes: RefCell<Vec<Entry<AttributeHandler, Attribute>>>,
    // waehrend compress aufgeloeste Imports
    imports: RefCell<Vec<Rc<Schema>>>,
    schema: RefCell<Option<Rc<Schema>>>,
}

impl SchemaHandler {
    pub(crate) fn new() -> Self {
        SchemaHandler {
            id: None,
            version: None,
            target_namespace: None,
            prefix: None,
            element_form_default: false,
            attribute_form_default: false,
            block_default: DerivationSet::Default,
            final_default: DerivationSet::Default,
            prefix_cache: RefCell::new(FastHashMap::default()),
            includes: Vec::new(),
            import_handlers: Vec::new(),
            redefines: Vec::new(),
            simple_types: RefCell::new(Vec::new()),
            complex_types: RefCell::new(Vec::new()),
            elements: RefCell::new(Vec::new()),
            groups: RefCell::new(Vec::new()),
            attribute_groups: RefCell::new(Vec::new()),
            attributes: RefCell::new(Vec::new()),
            imports: RefCell::new(Vec::new()),
            schema: RefCell::new(None),
        }
    }

    pub(crate) fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        match self.target_namespace.as_deref() {
            Some(tns) if tns == uri => self.prefix = Some(prefix.to_string()),
            _ => {}
        }
        self.prefix_cache
            .borrow_mut()
            .insert(uri.to_string(), prefix.to_string());
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.version = att_raw(atts, ns, "version");
        self.target_namespace = att(atts, ns, "targetNamespace").map(Rc::from);
        self.element_form_default = matches!(
            atts.get(ns, "elementFormDefault"),
            Some(v) if v.eq_ignore_ascii_case("qualified")
        );
        self.attribute_form_default = matches!(
            atts.get(ns, "attributeFormDefault"),
            Some(v) if v.eq_ignore_ascii_case("qualified")
        );
        self.block_default = parse_derivation(atts.get(ns, "blockDefault"), "blockDefault")?;
        self.final_default = parse_derivation(atts.get(ns, "finalDefault"), "finalDefault")?;

        // Das Prefix des Zielnamespace kann bereits als xmlns gemeldet sein.
        if let Some(tns) = self.target_namespace.as_deref() {
            if self.prefix.is_none() {
                self.prefix = self.prefix_cache.borrow().get(tns).cloned();
            }
        }
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        Ok(Some(match local {
            "element" => Handler::Element(ElementHandler::new()),
            "attribute" => Handler::Attribute(AttributeHandler::new()),
            "attributeGroup" => Handler::AttributeGroup(AttributeGroupHandler::new()),
            "complexType" => Handler::ComplexType(ComplexTypeHandler::new()),
            "simpleType" => Handler::SimpleType(SimpleTypeHandler::new()),
            "group" => Handler::Group(GroupHandler::new()),
            "import" => Handler::Import(ImportHandler::new()),
            "include" => Handler::Include(IncludeHandler::new()),
            "redefine" => Handler::Redefine(RedefineHandler::new()),
            _ => return Ok(None),
        }))
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::Element(h) => self.elements.borrow_mut().push(Entry::Raw(h)),
            Handler::Attribute(h) => self.attributes.borrow_mut().push(Entry::Raw(h)),
            Handler::AttributeGroup(h) => {
                self.attribute_groups.borrow_mut().push(Entry::Raw(h))
            }
            Handler::ComplexType(h) => self.complex_types.borrow_mut().push(Entry::Raw(h)),
            Handler::SimpleType(h) => self.simple_types.borrow_mut().push(Entry::Raw(h)),
            Handler::Group(h) => self.groups.borrow_mut().push(Entry::Raw(h)),
            Handler::Import(h) => self.import_handlers.push(h),
            Handler::Include(h) => self.includes.push(h),
            Handler::Redefine(h) => self.redefines.push(h),
            _ => unreachable!("schema: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    // --- Kontext fuer Kind-Handler ------------------------------------------

    pub(crate) fn target_ns(&self) -> Option<Rc<str>> {
        self.target_namespace.clone()
    }

    pub(crate) fn element_form_default(&self) -> bool {
        self.element_form_default
    }

    pub(crate) fn attribute_form_default(&self) -> bool {
        self.attribute_form_default
    }

    pub(crate) fn block_default(&self) -> DerivationSet {
        self.block_default
    }

    pub(crate) fn final_default(&self) -> DerivationSet {
        self.final_default
    }

    // --- include-Merge ------------------------------------------------------

    /// Uebernimmt alle Deklarationen eines per `include` (oder `redefine`)
    /// geladenen Schemas als fertige Eintraege. Duplikate raeumt die
    /// Sortier-Dedup-Passe am Ende von [`compress`](Self::compress) ab.
    fn add_schema(&self, other: &Schema) {
        self.simple_types
            .borrow_mut()
            .extend(other.simple_types.iter().cloned().map(Entry::Done));
        self.complex_types
            .borrow_mut()
            .extend(other.complex_types.iter().cloned().map(Entry::Done));
        self.elements
            .borrow_mut()
            .extend(other.elements.iter().cloned().map(Entry::Done));
        self.groups
            .borrow_mut()
            .extend(other.groups.iter().cloned().map(Entry::Done));
        self.attribute_groups
            .borrow_mut()
            .extend(other.attribute_groups.iter().cloned().map(Entry::Done));
        self.attributes
            .borrow_mut()
            .extend(other.attributes.iter().cloned().map(Entry::Done));
        self.imports.borrow_mut().extend(other.imports.iter().cloned());
    }

    // --- Kompilierung -------------------------------------------------------

    /// Loest Verweise auf, kompiliert alle Deklarationen und friert das
    /// Ergebnis ein. Wiederholte Aufrufe liefern denselben [`Rc<Schema>`].
    pub fn compress(
        &self,
        uri: Option<&str>,
        resolver: &dyn SchemaResolver,
    ) -> Result<Rc<Schema>> {
        if let Some(schema) = self.schema.borrow().as_ref() {
            return Ok(schema.clone());
        }

        // includes zuerst: ihre Deklarationen muessen fuer die Aufloesung
        // der lokalen Handler sichtbar sein
        for inc in &self.includes {
            match resolver.resolve(self.target_namespace.as_deref(), inc.schema_location(), uri)? {
                Some(other) => self.add_schema(&other),
                None => {
                    if let Some(loc) = inc.schema_location() {
                        warn!("include {loc} konnte nicht aufgeloest werden");
                    }
                }
            }
        }

        // redefine laedt wie include und haengt die Umdefinitionen an
        for red in &self.redefines {
            match resolver.resolve(self.target_namespace.as_deref(), red.schema_location(), uri)? {
                Some(other) => self.add_schema(&other),
                None => {
                    if let Some(loc) = red.schema_location() {
                        warn!("redefine {loc} konnte nicht aufgeloest werden");
                    }
                }
            }
            // Erst kompilieren, dann einhaengen: die Kompilierung liest die
            // Deklarationslisten, die der Merge mutiert.
            let simple = red
                .simple_types()
                .iter()
                .map(|h| h.compress(self))
                .collect::<Result<Vec<_>>>()?;
            let complex = red
                .complex_types()
                .iter()
                .map(|h| h.compress(self))
                .collect::<Result<Vec<_>>>()?;
            let groups = red
                .groups()
                .iter()
                .map(|h| h.compress(self))
                .collect::<Result<Vec<_>>>()?;
            let attr_groups = red
                .attribute_groups()
                .iter()
                .map(|h| h.compress(self))
                .collect::<Result<Vec<_>>>()?;
            self.simple_types
                .borrow_mut()
                .extend(simple.into_iter().map(Entry::Done));
            self.complex_types
                .borrow_mut()
                .extend(complex.into_iter().map(Entry::Done));
            self.groups
                .borrow_mut()
                .extend(groups.into_iter().map(Entry::Done));
            self.attribute_groups
                .borrow_mut()
                .extend(attr_groups.into_iter().map(Entry::Done));
        }

        // imports: eigener Zielnamespace ist tabu
        for imp in &self.import_handlers {
            if let (Some(tns), Some(ins)) = (self.target_namespace.as_deref(), imp.namespace()) {
                if tns == ins {
                    return Err(Error::SelfImport(ins.to_string()));
                }
            }
            match resolver.resolve(imp.namespace(), imp.schema_location(), uri)? {
                Some(other) => self.imports.borrow_mut().push(other),
                None => {
                    if let Some(loc) = imp.schema_location() {
                        warn!("import {loc} konnte nicht aufgeloest werden");
                    }
                }
            }
        }

        let mut simple_types = Vec::new();
        for entry in self.simple_types.borrow().iter() {
            simple_types.push(match entry {
                Entry::Raw(h) => h.compress(self)?,
                Entry::Done(t) => t.clone(),
            });
        }
        let mut complex_types = Vec::new();
        for entry in self.complex_types.borrow().iter() {
            complex_types.push(match entry {
                Entry::Raw(h) => h.compress(self)?,
                Entry::Done(t) => t.clone(),
            });
        }
        let mut elements = Vec::new();
        for entry in self.elements.borrow().iter() {
            elements.push(match entry {
                Entry::Raw(h) => h.compress(self)?,
                Entry::Done(e) => e.clone(),
            });
        }
        let mut groups = Vec::new();
        for entry in self.groups.borrow().iter() {
            groups.push(match entry {
                Entry::Raw(h) => h.compress(self)?,
                Entry::Done(g) => g.clone(),
            });
        }
        let mut attribute_groups = Vec::new();
        for entry in self.attribute_groups.borrow().iter() {
            attribute_groups.push(match entry {
                Entry::Raw(h) => h.compress(self)?,
                Entry::Done(g) => g.clone(),
            });
        }
        let mut attributes = Vec::new();
        for entry in self.attributes.borrow().iter() {
            attributes.push(match entry {
                Entry::Raw(h) => h.compress(self)?,
                Entry::Done(a) => a.clone(),
            });
        }

        let schema = Rc::new(Schema {
            target_namespace: self.target_namespace.clone(),
            prefix: self.prefix.clone(),
            uri: uri.map(str::to_string),
            id: self.id.clone(),
            version: self.version.clone(),
            element_form_default: self.element_form_default,
            attribute_form_default: self.attribute_form_default,
            block_default: self.block_default,
            final_default: self.final_default,
            elements: sort_dedup(elements, SchemaComparator::compare_element),
            complex_types: sort_dedup(complex_types, SchemaComparator::compare_complex_type),
            simple_types: sort_dedup(simple_types, SchemaComparator::compare_simple_type),
            groups: sort_dedup(groups, SchemaComparator::compare_group),
            attribute_groups: sort_dedup(
                attribute_groups,
                SchemaComparator::compare_attribute_group,
            ),
            attributes: sort_dedup(attributes, SchemaComparator::compare_attribute),
            imports: sort_dedup(
                self.imports.borrow().clone(),
                SchemaComparator::compare_import,
            ),
        });
        *self.schema.borrow_mut() = Some(schema.clone());
        Ok(schema)
    }

    // --- QName-Aufloesung ---------------------------------------------------

    /// Gehoert das Prefix eines QName zum eigenen Zielnamespace?
    fn owns_prefix(&self, pref: &str) -> bool {
        self.prefix.as_deref().unwrap_or("") == pref
    }

    /// Darf ein Import fuer dieses Prefix befragt werden? Ein Import ist
    /// tabu, wenn das Dokument seinem Namespace ein anderes Prefix
    /// zugewiesen hat.
    fn import_eligible(&self, import: &Schema, pref: &str) -> bool {
        let ns = import.target_namespace.as_deref().unwrap_or("");
        match self.prefix_cache.borrow().get(ns) {
            None => true,
            Some(known) => known == pref,
        }
    }

    /// Sucht in einem kompilierten Schema und transitiv in dessen Imports.
    /// `visited` haelt besuchte Namespaces und bricht Import-Zyklen.
    fn find_in<T>(
        schema: &Rc<Schema>,
        local: &str,
        visited: &mut FastHashSet<String>,
        items: fn(&Schema) -> &[Rc<T>],
        name: fn(&T) -> Option<&str>,
    ) -> Option<Rc<T>> {
        let key = schema.target_namespace.as_deref().unwrap_or("").to_string();
        if !visited.insert(key) {
            return None;
        }
        for item in items(schema) {
            if name(item).is_some_and(|n| n.eq_ignore_ascii_case(local)) {
                return Some(item.clone());
            }
        }
        for import in &schema.imports {
            if let Some(found) = Self::find_in(import, local, visited, items, name) {
                return Some(found);
            }
        }
        None
    }

    /// Gemeinsamer Kopf aller Lookups: eigenes kompiliertes Schema bei
    /// passendem Prefix, sonst die Imports. `None` heisst "hier nicht
    /// entschieden" — der Aufrufer scannt dann seine Rohliste.
    fn find_compiled<T>(
        &self,
        pref: &str,
        local: &str,
        items: fn(&Schema) -> &[Rc<T>],
        name: fn(&T) -> Option<&str>,
    ) -> Option<Rc<T>> {
        if self.owns_prefix(pref) {
            let compiled = self.schema.borrow().clone();
            if let Some(schema) = compiled {
                let mut visited = FastHashSet::default();
                return Self::find_in(&schema, local, &mut visited, items, name);
            }
        } else {
            for import in self.imports.borrow().iter() {
                if !self.import_eligible(import, pref) {
                    continue;
                }
                let mut visited = FastHashSet::default();
                if let Some(found) = Self::find_in(import, local, &mut visited, items, name) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub(crate) fn look_up_simple_type(&self, qname: &str) -> Result<Option<Rc<SimpleType>>> {
        let (pref, local) = split_qname(qname);
        if let Some(found) =
            self.find_compiled(pref, local, |s| s.simple_types.as_slice(), |t| t.name.as_deref())
        {
            return Ok(Some(found));
        }
        for entry in self.simple_types.borrow().iter() {
            match entry {
                Entry::Raw(h) if h.name_matches(local) => return h.compress(self).map(Some),
                Entry::Done(t)
                    if t.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local)) =>
                {
                    return Ok(Some(t.clone()))
                }
                _ => {}
            }
        }
        // eingebaute XSD-Typen als letzte Instanz
        Ok(builtins::find(local))
    }

    pub(crate) fn look_up_complex_type(&self, qname: &str) -> Result<Option<Rc<ComplexType>>> {
        let (pref, local) = split_qname(qname);
        if let Some(found) =
            self.find_compiled(pref, local, |s| s.complex_types.as_slice(), |t| t.name.as_deref())
        {
            return Ok(Some(found));
        }
        for entry in self.complex_types.borrow().iter() {
            match entry {
                Entry::Raw(h) if h.name_matches(local) => return h.compress(self).map(Some),
                Entry::Done(t)
                    if t.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local)) =>
                {
                    return Ok(Some(t.clone()))
                }
                _ => {}
            }
        }
        Ok(None)
    }

    pub(crate) fn look_up_element(&self, qname: &str) -> Result<Option<Rc<Element>>> {
        let (pref, local) = split_qname(qname);
        if let Some(found) =
            self.find_compiled(pref, local, |s| s.elements.as_slice(), |e| e.name.as_deref())
        {
            return Ok(Some(found));
        }
        for entry in self.elements.borrow().iter() {
            match entry {
                Entry::Raw(h) if h.name_matches(local) => return h.compress(self).map(Some),
                Entry::Done(e)
                    if e.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local)) =>
                {
                    return Ok(Some(e.clone()))
                }
                _ => {}
            }
        }
        Ok(None)
    }

    pub(crate) fn look_up_group(&self, qname: &str) -> Result<Option<Rc<Group>>> {
        let (pref, local) = split_qname(qname);
        if let Some(found) = self.find_compiled(pref, local, |s| s.groups.as_slice(), |g| g.name.as_deref())
        {
            return Ok(Some(found));
        }
        for entry in self.groups.borrow().iter() {
            match entry {
                Entry::Raw(h) if h.name_matches(local) => return h.compress(self).map(Some),
                Entry::Done(g)
                    if g.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local)) =>
                {
                    return Ok(Some(g.clone()))
                }
                _ => {}
            }
        }
        Ok(None)
    }

    pub(crate) fn look_up_attribute_group(
        &self,
        qname: &str,
    ) -> Result<Option<Rc<AttributeGroup>>> {
        let (pref, local) = split_qname(qname);
        if let Some(found) =
            self.find_compiled(pref, local, |s| s.attribute_groups.as_slice(), |g| g.name.as_deref())
        {
            return Ok(Some(found));
        }
        for entry in self.attribute_groups.borrow().iter() {
            match entry {
                Entry::Raw(h) if h.name_matches(local) => return h.compress(self).map(Some),
                Entry::Done(g)
                    if g.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local)) =>
                {
                    return Ok(Some(g.clone()))
                }
                _ => {}
            }
        }
        Ok(None)
    }

    pub(crate) fn look_up_attribute(&self, qname: &str) -> Result<Option<Rc<Attribute>>> {
        let (pref, local) = split_qname(qname);
        if let Some(found) =
            self.find_compiled(pref, local, |s| s.attributes.as_slice(), |a| a.name.as_deref())
        {
            return Ok(Some(found));
        }
        for entry in self.attributes.borrow().iter() {
            match entry {
                Entry::Raw(h) if h.name_matches(local) => return h.compress(self).map(Some),
                Entry::Done(a)
                    if a.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local)) =>
                {
                    return Ok(Some(a.clone()))
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Komplexe Typen haben Vorrang vor einfachen, eingebaute Typen kommen
    /// ueber [`look_up_simple_type`](Self::look_up_simple_type) zuletzt.
    pub(crate) fn look_up_type(&self, qname: &str) -> Result<Option<Type>> {
        if let Some(ct) = self.look_up_complex_type(qname)? {
            return Ok(Some(Type::Complex(ct)));
        }
        Ok(self.look_up_simple_type(qname)?.map(Type::Simple))
    }
}
