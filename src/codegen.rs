#![deny(missing_docs)]

//! # Code Model to Rust Source
//!
//! Renders a [`CodeNamespace`] as Rust source text, member order verbatim.
//! Custom attributes become marker attributes (`#[serializable]`,
//! `#[xml_type(namespace = "...")]`), facet checks become early-return
//! guards in the generated setter, and collection classes render as tuple
//! structs over `Vec<T>`.

use crate::code_model::{
    AttributeArgument, AttributeDecl, CodeNamespace, Constructor, Literal, Member, Method,
    Property, Statement, TypeDeclaration, TypeRef,
};
use heck::ToSnakeCase;

/// Renders a full namespace to source text.
pub fn render_namespace(namespace: &CodeNamespace) -> String {
    let mut code = String::new();

    // 1. Module header.
    if !namespace.name.is_empty() {
        code.push_str(&format!(
            "//! Generated types for the `{}` namespace.\n\n",
            namespace.name
        ));
    }

    // 2. Import directives.
    for import in &namespace.imports {
        code.push_str(&format!("use {};\n", import));
    }
    if !namespace.imports.is_empty() {
        code.push('\n');
    }

    // 3. Type declarations, in generation order.
    for (i, decl) in namespace.types.iter().enumerate() {
        if i > 0 {
            code.push('\n');
        }
        code.push_str(&render_type(decl));
    }

    code
}

/// Renders one declaration.
pub fn render_type(decl: &TypeDeclaration) -> String {
    let mut code = String::new();

    // 1. Doc comments and marker attributes.
    push_doc(&mut code, &decl.comments, "");
    for attribute in &decl.attributes {
        code.push_str(&render_attribute(attribute, ""));
    }

    if decl.is_enum {
        render_enum(&mut code, decl);
        return code;
    }
    if let Some(vec_base) = collection_base(decl) {
        // 2. Collection classes are plain newtypes over the vector.
        code.push_str("#[derive(Debug, Default, Clone, PartialEq)]\n");
        code.push_str(&format!("pub struct {}(pub {});\n", decl.name, vec_base));
        return code;
    }

    render_struct(&mut code, decl);
    code
}

fn render_enum(code: &mut String, decl: &TypeDeclaration) {
    code.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n");
    code.push_str(&format!("pub enum {} {{\n", decl.name));
    for member in &decl.members {
        if let Member::Field(variant) = member {
            push_doc(code, &variant.comments, "    ");
            for attribute in &variant.attributes {
                code.push_str(&render_attribute(attribute, "    "));
            }
            code.push_str(&format!("    {},\n", variant.name));
        }
    }
    code.push_str("}\n");
}

fn render_struct(code: &mut String, decl: &TypeDeclaration) {
    // 1. Real extension bases become an `extends` marker; the struct itself
    //    stays flat.
    for base in &decl.base_types {
        if !base.base.starts_with("Vec<") {
            code.push_str(&format!("#[extends({})]\n", base.base));
        }
    }
    code.push_str("#[derive(Debug, Default, Clone, PartialEq)]\n");
    code.push_str(&format!("pub struct {} {{\n", decl.name));

    // 2. Fields, then one backing field per property that declares one.
    let mut field_names: Vec<String> = Vec::new();
    for member in &decl.members {
        match member {
            Member::Field(field) => {
                push_doc(code, &field.comments, "    ");
                for attribute in &field.attributes {
                    code.push_str(&render_attribute(attribute, "    "));
                }
                let vis = if field.modifiers.public { "pub " } else { "" };
                code.push_str(&format!(
                    "    {}{}: {},\n",
                    vis,
                    field.name,
                    render_type_ref(&field.ty)
                ));
                field_names.push(field.name.clone());
            }
            Member::Property(property) => {
                let backing = backing_name(property);
                if !field_names.contains(&backing) {
                    for attribute in &property.attributes {
                        code.push_str(&render_attribute(attribute, "    "));
                    }
                    code.push_str(&format!(
                        "    {}: {},\n",
                        backing,
                        render_type_ref(&property.ty)
                    ));
                    field_names.push(backing);
                }
            }
            Member::Event(event) => {
                push_doc(code, &event.comments, "    ");
                for attribute in &event.attributes {
                    code.push_str(&render_attribute(attribute, "    "));
                }
                code.push_str(&format!(
                    "    pub {}: EventHandlers<{}>,\n",
                    event.name,
                    render_type_ref(&event.ty)
                ));
            }
            _ => {}
        }
    }
    code.push_str("}\n");

    // 3. Accessors, constructors and methods go into one impl block.
    let mut body = String::new();
    for member in &decl.members {
        match member {
            Member::Property(property) => body.push_str(&render_property(property)),
            Member::Method(method) => body.push_str(&render_method(method)),
            Member::Constructor(ctor) => body.push_str(&render_constructor(ctor)),
            _ => {}
        }
    }
    if !body.is_empty() {
        code.push_str(&format!("\nimpl {} {{\n{}}}\n", decl.name, body));
    }
}

fn backing_name(property: &Property) -> String {
    property
        .backing_field
        .clone()
        .unwrap_or_else(|| property.name.to_snake_case())
}

fn render_property(property: &Property) -> String {
    let mut code = String::new();
    let backing = backing_name(property);
    let accessor = property.name.to_snake_case();
    let ty = render_type_ref(&property.ty);

    push_doc(&mut code, &property.comments, "    ");
    code.push_str(&format!(
        "    pub fn {}(&self) -> &{} {{\n        &self.{}\n    }}\n",
        accessor, ty, backing
    ));

    if property.set_statements.is_empty() {
        code.push_str(&format!(
            "\n    pub fn set_{}(&mut self, value: {}) {{\n        self.{} = value;\n    }}\n",
            accessor, ty, backing
        ));
    } else {
        code.push_str(&format!(
            "\n    pub fn set_{}(&mut self, value: {}) -> Result<(), FacetViolation> {{\n",
            accessor, ty
        ));
        for statement in &property.set_statements {
            code.push_str(&render_statement(statement, "        "));
        }
        code.push_str(&format!(
            "        self.{} = value;\n        Ok(())\n    }}\n",
            backing
        ));
    }

    code
}

fn render_method(method: &Method) -> String {
    let mut code = String::new();
    push_doc(&mut code, &method.comments, "    ");

    let receiver = if method.modifiers.is_static {
        String::new()
    } else {
        "self".to_string()
    };
    let mut params: Vec<String> = Vec::new();
    if !receiver.is_empty() {
        params.push(receiver);
    }
    for (name, ty) in &method.parameters {
        params.push(format!("{}: {}", name, render_type_ref(ty)));
    }

    let ret = match &method.return_type {
        Some(ty) => format!(" -> {}", render_type_ref(ty)),
        None => String::new(),
    };

    code.push_str(&format!(
        "    pub fn {}({}){} {{\n",
        method.name,
        params.join(", "),
        ret
    ));
    for statement in &method.statements {
        code.push_str(&render_statement(statement, "        "));
    }
    code.push_str("    }\n");
    code
}

fn render_constructor(ctor: &Constructor) -> String {
    let mut code = String::new();
    push_doc(&mut code, &ctor.comments, "    ");
    let params: Vec<String> = ctor
        .parameters
        .iter()
        .map(|(name, ty)| format!("{}: {}", name, render_type_ref(ty)))
        .collect();
    code.push_str(&format!(
        "    pub fn new({}) -> Self {{\n",
        params.join(", ")
    ));
    for statement in &ctor.statements {
        code.push_str(&render_statement(statement, "        "));
    }
    code.push_str("    }\n");
    code
}

fn render_statement(statement: &Statement, indent: &str) -> String {
    match statement {
        Statement::Raw(text) => format!("{}{}\n", indent, text),
        Statement::FacetCheck { facet, condition } => format!(
            "{}if {} {{\n{}    return Err(FacetViolation::new({:?}, &value));\n{}}}\n",
            indent, condition, indent, facet, indent
        ),
    }
}

/// Renders a type reference; arrays become vectors.
pub fn render_type_ref(ty: &TypeRef) -> String {
    match &ty.array_element {
        Some(element) => format!("Vec<{}>", render_type_ref(element)),
        None => ty.base.clone(),
    }
}

fn render_attribute(attribute: &AttributeDecl, indent: &str) -> String {
    let name = attribute.name.to_snake_case();
    if attribute.arguments.is_empty() {
        return format!("{}#[{}]\n", indent, name);
    }
    let args: Vec<String> = attribute
        .arguments
        .iter()
        .map(render_attribute_argument)
        .collect();
    format!("{}#[{}({})]\n", indent, name, args.join(", "))
}

fn render_attribute_argument(argument: &AttributeArgument) -> String {
    let value = match &argument.value {
        Literal::Str(s) => format!("{:?}", s),
        Literal::Int(n) => n.to_string(),
        Literal::Bool(b) => b.to_string(),
    };
    match &argument.name {
        Some(name) => format!("{} = {}", name.to_snake_case(), value),
        None => value,
    }
}

fn push_doc(code: &mut String, comments: &[String], indent: &str) {
    for line in comments {
        code.push_str(&format!("{}/// {}\n", indent, line));
    }
}

/// Collection classes carry a single `Vec<...>` base and no members of
/// their own.
fn collection_base(decl: &TypeDeclaration) -> Option<&str> {
    if decl.members.is_empty() {
        decl.base_types
            .iter()
            .map(|b| b.base.as_str())
            .find(|b| b.starts_with("Vec<"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{Field, MemberModifiers};

    #[test]
    fn test_render_struct_with_attributes() {
        let mut decl = TypeDeclaration::class("Person");
        decl.comments.push("A person record.".into());
        decl.attributes.push(AttributeDecl::new("Serializable"));
        decl.attributes
            .push(AttributeDecl::new("XmlType").with_named_str("Namespace", "urn:people"));
        decl.members.push(Member::Field(Field {
            name: "name".into(),
            ty: TypeRef::new("String"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
        }));

        let code = render_type(&decl);
        assert!(code.contains("/// A person record."));
        assert!(code.contains("#[serializable]"));
        assert!(code.contains("#[xml_type(namespace = \"urn:people\")]"));
        assert!(code.contains("pub struct Person {"));
        assert!(code.contains("pub name: String,"));
    }

    #[test]
    fn test_render_collection_as_newtype() {
        let mut decl = TypeDeclaration::class("LineCollection");
        decl.base_types.push(TypeRef::new("Vec<Line>"));

        let code = render_type(&decl);
        assert!(code.contains("pub struct LineCollection(pub Vec<Line>);"));
    }

    #[test]
    fn test_render_enum() {
        let mut decl = TypeDeclaration::enumeration("Priority");
        for name in ["Low", "High"] {
            decl.members.push(Member::Field(Field {
                name: name.into(),
                ty: TypeRef::default(),
                modifiers: MemberModifiers::public(),
                attributes: Vec::new(),
                comments: Vec::new(),
            }));
        }

        let code = render_type(&decl);
        assert!(code.contains("pub enum Priority {"));
        assert!(code.contains("    Low,"));
        assert!(code.contains("    High,"));
    }

    #[test]
    fn test_facet_checked_setter() {
        let mut decl = TypeDeclaration::class("Sku");
        decl.members.push(Member::Property(Property {
            name: "Value".into(),
            ty: TypeRef::new("String"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
            backing_field: Some("value".into()),
            set_statements: vec![Statement::FacetCheck {
                facet: "maxLength".into(),
                condition: "value.chars().count() as u32 > 12".into(),
            }],
        }));

        let code = render_type(&decl);
        assert!(code.contains("pub fn set_value(&mut self, value: String) -> Result<(), FacetViolation>"));
        assert!(code.contains("if value.chars().count() as u32 > 12 {"));
        assert!(code.contains("return Err(FacetViolation::new(\"maxLength\", &value));"));
        assert!(code.contains("self.value = value;"));
    }

    #[test]
    fn test_array_field_renders_as_vec() {
        let ty = TypeRef::array_of(TypeRef::new("Line"));
        assert_eq!(render_type_ref(&ty), "Vec<Line>");
    }

    #[test]
    fn test_base_type_renders_as_extends_marker() {
        let mut decl = TypeDeclaration::class("Employee");
        decl.base_types.push(TypeRef::new("Person"));
        let code = render_type(&decl);
        assert!(code.contains("#[extends(Person)]"));
    }
}
