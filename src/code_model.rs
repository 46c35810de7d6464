#![deny(missing_docs)]

//! # Code Model
//!
//! The in-memory, language-agnostic tree of namespace / type / member
//! declarations used as the pivot between schema import and code rendering.
//! The importer creates it, the modifier pipeline mutates it in place, and
//! the renderer consumes it without further mutation.
//!
//! Member names are unique only within the slice a given modifier cares
//! about; nothing here enforces global uniqueness, so modifiers scan
//! defensively instead of assuming.

/// A namespace: ordered type declarations plus import directives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeNamespace {
    /// Namespace name; may be empty.
    pub name: String,
    /// Import directives in insertion order.
    pub imports: Vec<String>,
    /// Type declarations in generation order.
    pub types: Vec<TypeDeclaration>,
}

impl CodeNamespace {
    /// Creates a namespace with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Finds a declaration by name. Type references resolve by name-scan,
    /// never by pointer: separately generated fragments do not share
    /// declaration identity.
    pub fn find_type(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Mutable variant of [`CodeNamespace::find_type`].
    pub fn find_type_mut(&mut self, name: &str) -> Option<&mut TypeDeclaration> {
        self.types.iter_mut().find(|t| t.name == name)
    }

    /// Adds an import directive unless already present.
    pub fn add_import_once(&mut self, import: &str) {
        if !self.imports.iter().any(|i| i == import) {
            self.imports.push(import.to_string());
        }
    }
}

/// A reference to a type by name, with optional array shape. Array shape is
/// mutually exclusive with the base naming a generated collection class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeRef {
    /// Base type name, e.g. `String`, `Person`, `Vec<Person>`.
    pub base: String,
    /// Element type when this reference is an array.
    pub array_element: Option<Box<TypeRef>>,
    /// Array rank; zero for non-arrays.
    pub array_rank: u8,
}

impl TypeRef {
    /// A plain named reference.
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            ..Default::default()
        }
    }

    /// A rank-one array of the given element type.
    pub fn array_of(element: TypeRef) -> Self {
        Self {
            base: String::new(),
            array_element: Some(Box::new(element)),
            array_rank: 1,
        }
    }

    /// True when this reference carries array shape.
    pub fn is_array(&self) -> bool {
        self.array_element.is_some()
    }

    /// If the base is an `Option<T>` spelling, returns `T`.
    pub fn nullable_inner(&self) -> Option<&str> {
        self.base
            .strip_prefix("Option<")
            .and_then(|rest| rest.strip_suffix('>'))
    }
}

/// A literal attribute-argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// String literal.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Boolean literal.
    Bool(bool),
}

/// One attribute argument, positional or named.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeArgument {
    /// Argument name; positional when `None`.
    pub name: Option<String>,
    /// Literal value.
    pub value: Literal,
}

/// A custom attribute attached to a declaration or member.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    /// Attribute name, e.g. `XmlType`, `NonSerialized`, `ProtoMember`.
    pub name: String,
    /// Ordered arguments.
    pub arguments: Vec<AttributeArgument>,
}

impl AttributeDecl {
    /// An argument-less attribute.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            arguments: Vec::new(),
        }
    }

    /// Adds a named string argument.
    pub fn with_named_str(mut self, name: &str, value: &str) -> Self {
        self.arguments.push(AttributeArgument {
            name: Some(name.to_string()),
            value: Literal::Str(value.to_string()),
        });
        self
    }

    /// Adds a positional argument.
    pub fn with_positional(mut self, value: Literal) -> Self {
        self.arguments.push(AttributeArgument { name: None, value });
        self
    }

    /// Returns the value of a named string argument.
    pub fn named_str(&self, name: &str) -> Option<&str> {
        self.arguments.iter().find_map(|a| {
            if a.name.as_deref() == Some(name) {
                match &a.value {
                    Literal::Str(s) => Some(s.as_str()),
                    _ => None,
                }
            } else {
                None
            }
        })
    }
}

/// Visibility and inheritance flags carried by every member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberModifiers {
    /// Public vs private.
    pub public: bool,
    /// Static member.
    pub is_static: bool,
    /// Overrides a base member.
    pub is_override: bool,
    /// Overridable.
    pub is_virtual: bool,
    /// Sealed against overriding.
    pub is_final: bool,
}

impl MemberModifiers {
    /// Plain public member.
    pub fn public() -> Self {
        Self {
            public: true,
            ..Default::default()
        }
    }
}

/// A statement inside a property or method body. Bodies are opaque ordered
/// sequences except for the facet-validation statement, which the renderer
/// and the simple-type extension both understand structurally.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Verbatim statement text.
    Raw(String),
    /// Conditional throw naming the failing facet. `condition` is the
    /// violation test over the in-scope `value` binding.
    FacetCheck {
        /// Facet name reported on violation.
        facet: String,
        /// Violation condition text.
        condition: String,
    },
}

/// A data field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: TypeRef,
    /// Flags.
    pub modifiers: MemberModifiers,
    /// Custom attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Doc comment lines.
    pub comments: Vec<String>,
}

/// A property with optional getter/setter bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property type.
    pub ty: TypeRef,
    /// Flags.
    pub modifiers: MemberModifiers,
    /// Custom attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Doc comment lines.
    pub comments: Vec<String>,
    /// Backing field name for the default get/set bodies.
    pub backing_field: Option<String>,
    /// Setter statements executed before assignment (facet checks).
    pub set_statements: Vec<Statement>,
}

/// A method or synthesized conversion operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Return type; `None` for unit.
    pub return_type: Option<TypeRef>,
    /// Ordered `(name, type)` parameters.
    pub parameters: Vec<(String, TypeRef)>,
    /// Flags.
    pub modifiers: MemberModifiers,
    /// Custom attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Doc comment lines.
    pub comments: Vec<String>,
    /// Opaque body.
    pub statements: Vec<Statement>,
}

/// A constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    /// Ordered `(name, type)` parameters.
    pub parameters: Vec<(String, TypeRef)>,
    /// Flags.
    pub modifiers: MemberModifiers,
    /// Custom attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Doc comment lines.
    pub comments: Vec<String>,
    /// Opaque body.
    pub statements: Vec<Statement>,
}

/// An event member.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name.
    pub name: String,
    /// Handler payload type.
    pub ty: TypeRef,
    /// Flags.
    pub modifiers: MemberModifiers,
    /// Custom attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Doc comment lines.
    pub comments: Vec<String>,
}

/// A member of a type declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// Data field.
    Field(Field),
    /// Property.
    Property(Property),
    /// Method.
    Method(Method),
    /// Constructor.
    Constructor(Constructor),
    /// Event.
    Event(Event),
}

impl Member {
    /// Member name; constructors report `new`.
    pub fn name(&self) -> &str {
        match self {
            Member::Field(f) => &f.name,
            Member::Property(p) => &p.name,
            Member::Method(m) => &m.name,
            Member::Constructor(_) => "new",
            Member::Event(e) => &e.name,
        }
    }

    /// Doc comment lines.
    pub fn comments(&self) -> &[String] {
        match self {
            Member::Field(f) => &f.comments,
            Member::Property(p) => &p.comments,
            Member::Method(m) => &m.comments,
            Member::Constructor(c) => &c.comments,
            Member::Event(e) => &e.comments,
        }
    }

    /// Mutable doc comment lines.
    pub fn comments_mut(&mut self) -> &mut Vec<String> {
        match self {
            Member::Field(f) => &mut f.comments,
            Member::Property(p) => &mut p.comments,
            Member::Method(m) => &mut m.comments,
            Member::Constructor(c) => &mut c.comments,
            Member::Event(e) => &mut e.comments,
        }
    }

    /// Mutable attribute list.
    pub fn attributes_mut(&mut self) -> &mut Vec<AttributeDecl> {
        match self {
            Member::Field(f) => &mut f.attributes,
            Member::Property(p) => &mut p.attributes,
            Member::Method(m) => &mut m.attributes,
            Member::Constructor(c) => &mut c.attributes,
            Member::Event(e) => &mut e.attributes,
        }
    }
}

/// A type declaration: class or enum.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDeclaration {
    /// Type name.
    pub name: String,
    /// Enum vs class.
    pub is_enum: bool,
    /// Abstract classes are never instantiated by the smoke-test step.
    pub is_abstract: bool,
    /// Base type references; `Object` may appear explicitly until the
    /// object-base stripper runs.
    pub base_types: Vec<TypeRef>,
    /// Custom attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Ordered members.
    pub members: Vec<Member>,
    /// Doc comment lines.
    pub comments: Vec<String>,
}

impl TypeDeclaration {
    /// Creates an empty class declaration.
    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Creates an empty enum declaration.
    pub fn enumeration(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_enum: true,
            ..Default::default()
        }
    }

    /// Returns the XML namespace recorded by the `XmlType` attribute, if
    /// any.
    pub fn xml_namespace(&self) -> Option<&str> {
        self.attributes
            .iter()
            .filter(|a| a.name == "XmlType")
            .find_map(|a| a.named_str("Namespace"))
    }

    /// Returns an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(f) => Some(f),
            _ => None,
        })
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.members.iter().filter_map(|m| match m {
            Member::Property(p) => Some(p),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_type_by_name_scan() {
        let mut ns = CodeNamespace::new("generated");
        ns.types.push(TypeDeclaration::class("Person"));
        ns.types.push(TypeDeclaration::class("Address"));

        assert!(ns.find_type("Person").is_some());
        assert!(ns.find_type("Missing").is_none());
    }

    #[test]
    fn test_add_import_once() {
        let mut ns = CodeNamespace::new("generated");
        ns.add_import_once("shared::geo");
        ns.add_import_once("shared::geo");
        assert_eq!(ns.imports.len(), 1);
    }

    #[test]
    fn test_nullable_inner() {
        let ty = TypeRef::new("Option<i32>");
        assert_eq!(ty.nullable_inner(), Some("i32"));
        assert_eq!(TypeRef::new("i32").nullable_inner(), None);
    }

    #[test]
    fn test_xml_namespace_lookup() {
        let mut decl = TypeDeclaration::class("Person");
        decl.attributes.push(
            AttributeDecl::new("XmlType").with_named_str("Namespace", "urn:people"),
        );
        assert_eq!(decl.xml_namespace(), Some("urn:people"));
    }
}
