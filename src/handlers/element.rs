//! Handler fuer `element`-Deklarationen (global und lokal).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;

use crate::error::{Error, Result};
use crate::handlers::{
    att, att_raw, parse_bool, parse_derivation, parse_form, parse_occurs, ComplexTypeHandler,
    Handler, SchemaHandler, SimpleTypeHandler,
};
use crate::reader::ElementAttributes;
use crate::schema::{DerivationSet, Element, MaxOccurs, Occurs, Type};

enum ElementChild {
    Simple(SimpleTypeHandler),
    Complex(ComplexTypeHandler),
}

pub(crate) struct ElementHandler {
    id: Option<String>,
    name: Option<String>,
    type_attr: Option<String>,
    ref_attr: Option<String>,
    substitution_group_attr: Option<String>,
    default: Option<String>,
    fixed: Option<String>,
    form: Option<String>,
    occurs: Occurs,
    abstract_: bool,
    nillable: bool,
    block: DerivationSet,
    final_: DerivationSet,
    child: Option<ElementChild>,
    cache: RefCell<Option<Rc<Element>>>,
    busy: Cell<bool>,
}

impl ElementHandler {
    pub(crate) fn new() -> Self {
        ElementHandler {
            id: None,
            name: None,
            type_attr: None,
            ref_attr: None,
            substitution_group_attr: None,
            default: None,
            fixed: None,
            form: None,
            occurs: Occurs::once(),
            abstract_: false,
            nillable: false,
            block: DerivationSet::Default,
            final_: DerivationSet::Default,
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
        self.substitution_group_attr = att(atts, ns, "substitutionGroup");
        self.default = att_raw(atts, ns, "default");
        self.fixed = att_raw(atts, ns, "fixed");
        self.form = att(atts, ns, "form");
        self.occurs = parse_occurs(atts, ns)?;
        self.abstract_ = parse_bool(atts.get(ns, "abstract"));
        self.nillable = parse_bool(atts.get(ns, "nillable"));
        self.block = parse_derivation(atts.get(ns, "block"), "block")?;
        self.final_ = parse_derivation(atts.get(ns, "final"), "final")?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "simpleType" | "complexType" if self.child.is_some() => Err(Error::DuplicateChild {
                parent: "element",
                child: local.to_string(),
            }),
            "simpleType" => Ok(Some(Handler::SimpleType(SimpleTypeHandler::new()))),
            "complexType" => Ok(Some(Handler::ComplexType(ComplexTypeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::SimpleType(h) => self.child = Some(ElementChild::Simple(h)),
            Handler::ComplexType(h) => self.child = Some(ElementChild::Complex(h)),
            _ => unreachable!("element: unerwarteter Kind-Handler"),
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
            .unwrap_or("element")
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<Element>> {
        if let Some(element) = self.cache.borrow().as_ref() {
            return Ok(element.clone());
        }
        if self.busy.replace(true) {
            return Err(Error::CircularReference(self.display_name().to_string()));
        }
        let result = self.compress_inner(parent);
        self.busy.set(false);
        let element = result?;
        *self.cache.borrow_mut() = Some(element.clone());
        Ok(element)
    }

    fn compress_inner(&self, parent: &SchemaHandler) -> Result<Rc<Element>> {
        if let Some(r) = self.ref_attr.as_deref() {
            if self.name.is_some() {
                return Err(Error::ConflictingDeclaration {
                    name: r.to_string(),
                    detail: "element darf nicht ref und name zugleich tragen",
                });
            }
            if self.type_attr.is_some() {
                return Err(Error::ConflictingDeclaration {
                    name: r.to_string(),
                    detail: "element darf nicht ref und type zugleich tragen",
                });
            }
            let target = parent
                .look_up_element(r)?
                .ok_or_else(|| Error::ReferenceNotFound {
                    kind: "element",
                    name: r.to_string(),
                })?;
            // Occurs nur uebernehmen, wo die Referenz beim Default blieb
            let occurs = Occurs {
                min: if self.occurs.min == 1 {
                    target.occurs.min
                } else {
                    self.occurs.min
                },
                max: if self.occurs.max == MaxOccurs::Bounded(1) {
                    target.occurs.max
                } else {
                    self.occurs.max
                },
            };
            return Ok(Rc::new(Element {
                name: target.name.clone(),
                namespace: target.namespace.clone(),
                id: self.id.clone(),
                type_: target.type_.clone(),
                occurs,
                abstract_: target.abstract_,
                nillable: target.nillable,
                default: self.default.clone().or_else(|| target.default.clone()),
                fixed: self.fixed.clone().or_else(|| target.fixed.clone()),
                form_qualified: target.form_qualified,
                block: if self.block == DerivationSet::Default {
                    target.block
                } else {
                    self.block
                },
                final_: if self.final_ == DerivationSet::Default {
                    target.final_
                } else {
                    self.final_
                },
                substitution_group: target.substitution_group.clone(),
            }));
        }

        let type_ = match (&self.child, self.type_attr.as_deref()) {
            (Some(ElementChild::Simple(h)), _) => Some(Type::Simple(h.compress(parent)?)),
            (Some(ElementChild::Complex(h)), _) => Some(Type::Complex(h.compress(parent)?)),
            (None, Some(t)) => {
                let looked = parent.look_up_type(t)?;
                if looked.is_none() {
                    warn!(
                        "Typ {t} von element {} nicht aufloesbar",
                        self.display_name()
                    );
                }
                looked
            }
            (None, None) => None,
        };

        let substitution_group = match self.substitution_group_attr.as_deref() {
            Some(sg) => {
                let head = parent.look_up_element(sg)?;
                if head.is_none() {
                    warn!(
                        "substitutionGroup {sg} von element {} nicht aufloesbar",
                        self.display_name()
                    );
                }
                head
            }
            None => None,
        };

        Ok(Rc::new(Element {
            name: self.name.as_deref().map(Rc::from),
            namespace: parent.target_ns(),
            id: self.id.clone(),
            type_,
            occurs: self.occurs,
            abstract_: self.abstract_,
            nillable: self.nillable,
            default: self.default.clone(),
            fixed: self.fixed.clone(),
            form_qualified: parse_form(self.form.as_deref(), parent.element_form_default()),
            block: if self.block == DerivationSet::Default {
                parent.block_default()
            } else {
                self.block
            },
            final_: if self.final_ == DerivationSet::Default {
                parent.final_default()
            } else {
                self.final_
            },
            substitution_group,
        }))
    }
}
