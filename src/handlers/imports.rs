//! Handler fuer `import`, `include` und `redefine`.

use crate::error::{Error, Result};
use crate::handlers::{
    att, att_raw, AttributeGroupHandler, ComplexTypeHandler, GroupHandler, Handler,
    SimpleTypeHandler,
};
use crate::reader::ElementAttributes;

fn check_uri(value: &str) -> Result<()> {
    if value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidUri(value.to_string()));
    }
    Ok(())
}

pub(crate) struct ImportHandler {
    #[allow(dead_code)]
    id: Option<String>,
    namespace: Option<String>,
    schema_location: Option<String>,
}

impl ImportHandler {
    pub(crate) fn new() -> Self {
        ImportHandler {
            id: None,
            namespace: None,
            schema_location: None,
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.namespace = att(atts, ns, "namespace");
        self.schema_location = att(atts, ns, "schemaLocation");
        if let Some(n) = self.namespace.as_deref() {
            check_uri(n)?;
        }
        if let Some(l) = self.schema_location.as_deref() {
            check_uri(l)?;
        }
        Ok(())
    }

    pub(crate) fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub(crate) fn schema_location(&self) -> Option<&str> {
        self.schema_location.as_deref()
    }
}

pub(crate) struct IncludeHandler {
    #[allow(dead_code)]
    id: Option<String>,
    schema_location: Option<String>,
}

impl IncludeHandler {
    pub(crate) fn new() -> Self {
        IncludeHandler {
            id: None,
            schema_location: None,
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.schema_location = att(atts, ns, "schemaLocation");
        if let Some(l) = self.schema_location.as_deref() {
            check_uri(l)?;
        }
        Ok(())
    }

    pub(crate) fn schema_location(&self) -> Option<&str> {
        self.schema_location.as_deref()
    }
}

/// `redefine` wird wie ein `include` geladen; die lokal umdefinierten
/// Deklarationen kommen zusaetzlich in die Listen des Schemas. Eine echte
/// Ersetzung der gleichnamigen Basisdeklaration findet nicht statt.
pub(crate) struct RedefineHandler {
    #[allow(dead_code)]
    id: Option<String>,
    schema_location: Option<String>,
    simple_types: Vec<SimpleTypeHandler>,
    complex_types: Vec<ComplexTypeHandler>,
    groups: Vec<GroupHandler>,
    attribute_groups: Vec<AttributeGroupHandler>,
}

impl RedefineHandler {
    pub(crate) fn new() -> Self {
        RedefineHandler {
            id: None,
            schema_location: None,
            simple_types: Vec::new(),
            complex_types: Vec::new(),
            groups: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.schema_location = att(atts, ns, "schemaLocation");
        if let Some(l) = self.schema_location.as_deref() {
            check_uri(l)?;
        }
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        Ok(Some(match local {
            "simpleType" => Handler::SimpleType(SimpleTypeHandler::new()),
            "complexType" => Handler::ComplexType(ComplexTypeHandler::new()),
            "group" => Handler::Group(GroupHandler::new()),
            "attributeGroup" => Handler::AttributeGroup(AttributeGroupHandler::new()),
            _ => return Ok(None),
        }))
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::SimpleType(h) => self.simple_types.push(h),
            Handler::ComplexType(h) => self.complex_types.push(h),
            Handler::Group(h) => self.groups.push(h),
            Handler::AttributeGroup(h) => self.attribute_groups.push(h),
            _ => unreachable!("redefine: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn schema_location(&self) -> Option<&str> {
        self.schema_location.as_deref()
    }

    pub(crate) fn simple_types(&self) -> &[SimpleTypeHandler] {
        &self.simple_types
    }

    pub(crate) fn complex_types(&self) -> &[ComplexTypeHandler] {
        &self.complex_types
    }

    pub(crate) fn groups(&self) -> &[GroupHandler] {
        &self.groups
    }

    pub(crate) fn attribute_groups(&self) -> &[AttributeGroupHandler] {
        &self.attribute_groups
    }
}
