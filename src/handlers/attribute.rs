//! Handler fuer Attributdeklarationen, Attributgruppen und das
//! `anyAttribute`-Wildcard.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;

use crate::error::{Error, Result};
use crate::handlers::{
    att, att_raw, parse_form, parse_use, AttrDec, Handler, SchemaHandler, SimpleTypeHandler,
};
use crate::reader::ElementAttributes;
use crate::schema::{Attribute, AttributeGroup};

pub(crate) struct AttributeHandler {
    id: Option<String>,
    name: Option<String>,
    type_attr: Option<String>,
    ref_attr: Option<String>,
    use_attr: Option<String>,
    default: Option<String>,
    fixed: Option<String>,
    form: Option<String>,
    child: Option<SimpleTypeHandler>,
    cache: RefCell<Option<Rc<Attribute>>>,
    busy: Cell<bool>,
}

impl AttributeHandler {
    pub(crate) fn new() -> Self {
        AttributeHandler {
            id: None,
            name: None,
            type_attr: None,
            ref_attr: None,
            use_attr: None,
            default: None,
            fixed: None,
            form: None,
            child: None,
            cache: RefCell::new(None),
            busy: Cell::new(false),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.name = att(atts, ns, "name");
        self.type_attr = att(atts, ns, "type");
        self.ref_attr = att(atts, ns, "ref");
        self.use_attr = att(atts, ns, "use");
        self.default = att_raw(atts, ns, "default");
        self.fixed = att_raw(atts, ns, "fixed");
        self.form = att(atts, ns, "form");
        // Token frueh validieren, der Fehler soll auf das Dokument zeigen
        parse_use(self.use_attr.as_deref())?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "simpleType" if self.child.is_some() => Err(Error::DuplicateChild {
                parent: "attribute",
                child: local.to_string(),
            }),
            "simpleType" => Ok(Some(Handler::SimpleType(SimpleTypeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::SimpleType(h) => self.child = Some(h),
            _ => unreachable!("attribute: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn name_matches(&self, local: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local))
    }

    fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.ref_attr.as_deref())
            .unwrap_or("attribute")
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<Attribute>> {
        if let Some(attribute) = self.cache.borrow().as_ref() {
            return Ok(attribute.clone());
        }
        if self.busy.replace(true) {
            return Err(Error::CircularReference(self.display_name().to_string()));
        }
        let result = self.compress_inner(parent);
        self.busy.set(false);
        let attribute = result?;
        *self.cache.borrow_mut() = Some(attribute.clone());
        Ok(attribute)
    }

    fn compress_inner(&self, parent: &SchemaHandler) -> Result<Rc<Attribute>> {
        if let Some(r) = self.ref_attr.as_deref() {
            if self.name.is_some() {
                return Err(Error::ConflictingDeclaration {
                    name: r.to_string(),
                    detail: "attribute darf nicht ref und name zugleich tragen",
                });
            }
            if self.type_attr.is_some() {
                return Err(Error::ConflictingDeclaration {
                    name: r.to_string(),
                    detail: "attribute darf nicht ref und type zugleich tragen",
                });
            }
            let target = parent
                .look_up_attribute(r)?
                .ok_or_else(|| Error::ReferenceNotFound {
                    kind: "attribute",
                    name: r.to_string(),
                })?;
            // lokale use/default/fixed ueberschreiben die Referenz
            let use_ = match self.use_attr.as_deref() {
                Some(v) => parse_use(Some(v))?,
                None => target.use_,
            };
            return Ok(Rc::new(Attribute {
                name: target.name.clone(),
                namespace: target.namespace.clone(),
                id: self.id.clone(),
                simple_type: target.simple_type.clone(),
                use_,
                default: self.default.clone().or_else(|| target.default.clone()),
                fixed: self.fixed.clone().or_else(|| target.fixed.clone()),
                form_qualified: target.form_qualified,
            }));
        }

        let simple_type = match (&self.child, self.type_attr.as_deref()) {
            (Some(h), _) => Some(h.compress(parent)?),
            (None, Some(t)) => {
                let looked = parent.look_up_simple_type(t)?;
                if looked.is_none() {
                    warn!(
                        "Typ {t} von attribute {} nicht aufloesbar",
                        self.display_name()
                    );
                }
                looked
            }
            (None, None) => None,
        };

        Ok(Rc::new(Attribute {
            name: self.name.as_deref().map(Rc::from),
            namespace: parent.target_ns(),
            id: self.id.clone(),
            simple_type,
            use_: parse_use(self.use_attr.as_deref())?,
            default: self.default.clone(),
            fixed: self.fixed.clone(),
            form_qualified: parse_form(self.form.as_deref(), parent.attribute_form_default()),
        }))
    }
}

pub(crate) struct AttributeGroupHandler {
    id: Option<String>,
    name: Option<String>,
    ref_attr: Option<String>,
    any_attribute: Option<AnyAttributeHandler>,
    decs: Vec<AttrDec>,
    cache: RefCell<Option<Rc<AttributeGroup>>>,
    busy: Cell<bool>,
}

impl AttributeGroupHandler {
    pub(crate) fn new() -> Self {
        AttributeGroupHandler {
            id: None,
            name: None,
            ref_attr: None,
            any_attribute: None,
            decs: Vec::new(),
            cache: RefCell::new(None),
            busy: Cell::new(false),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.name = att(atts, ns, "name");
        self.ref_attr = att(atts, ns, "ref");
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "attribute" => Ok(Some(Handler::Attribute(AttributeHandler::new()))),
            "attributeGroup" => Ok(Some(Handler::AttributeGroup(AttributeGroupHandler::new()))),
            "anyAttribute" if self.any_attribute.is_some() => Err(Error::DuplicateChild {
                parent: "attributeGroup",
                child: local.to_string(),
            }),
            "anyAttribute" => Ok(Some(Handler::AnyAttribute(AnyAttributeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::Attribute(h) => self.decs.push(AttrDec::Attribute(h)),
            Handler::AttributeGroup(h) => self.decs.push(AttrDec::Group(h)),
            Handler::AnyAttribute(h) => self.any_attribute = Some(h),
            _ => unreachable!("attributeGroup: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn name_matches(&self, local: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local))
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<AttributeGroup>> {
        if let Some(group) = self.cache.borrow().as_ref() {
            return Ok(group.clone());
        }
        if self.busy.replace(true) {
            return Err(Error::CircularReference(
                self.name.clone().unwrap_or_else(|| "attributeGroup".to_string()),
            ));
        }
        let result = self.compress_inner(parent);
        self.busy.set(false);
        let group = result?;
        *self.cache.borrow_mut() = Some(group.clone());
        Ok(group)
    }

    fn compress_inner(&self, parent: &SchemaHandler) -> Result<Rc<AttributeGroup>> {
        if let Some(r) = self.ref_attr.as_deref() {
            return parent
                .look_up_attribute_group(r)?
                .ok_or_else(|| Error::ReferenceNotFound {
                    kind: "attributeGroup",
                    name: r.to_string(),
                });
        }
        let mut attributes = Vec::new();
        collect_attributes(&self.decs, parent, &mut attributes)?;
        Ok(Rc::new(AttributeGroup {
            name: self.name.as_deref().map(Rc::from),
            namespace: parent.target_ns(),
            id: self.id.clone(),
            any_attribute_namespace: self
                .any_attribute
                .as_ref()
                .map(AnyAttributeHandler::namespace),
            attributes,
        }))
    }
}

pub(crate) struct AnyAttributeHandler {
    #[allow(dead_code)]
    id: Option<String>,
    namespace: Option<String>,
}

impl AnyAttributeHandler {
    pub(crate) fn new() -> Self {
        AnyAttributeHandler {
            id: None,
            namespace: None,
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.namespace = att(atts, ns, "namespace");
        Ok(())
    }

    /// Namespace-Constraint des Wildcards, Default `##any`.
    pub(crate) fn namespace(&self) -> String {
        self.namespace.clone().unwrap_or_else(|| "##any".to_string())
    }
}

/// Sammelt Attribute aus einer Deklarationsliste ein und flacht
/// Gruppenverweise aus. Identische Deklarationen (gleicher Knoten, etwa
/// ueber zwei Gruppen hereingekommen) werden nur einmal aufgenommen.
pub(crate) fn collect_attributes(
    decs: &[AttrDec],
    parent: &SchemaHandler,
    out: &mut Vec<Rc<Attribute>>,
) -> Result<()> {
    fn push_unique(out: &mut Vec<Rc<Attribute>>, attribute: Rc<Attribute>) {
        if !out.iter().any(|a| Rc::ptr_eq(a, &attribute)) {
            out.push(attribute);
        }
    }
    for dec in decs {
        match dec {
            AttrDec::Attribute(h) => push_unique(out, h.compress(parent)?),
            AttrDec::Group(h) => {
                let group = h.compress(parent)?;
                for attribute in &group.attributes {
                    push_unique(out, attribute.clone());
                }
            }
        }
    }
    Ok(())
}
