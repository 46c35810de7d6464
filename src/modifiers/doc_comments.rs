//! Doc-comment generation for undocumented declarations.

use super::CodeModifier;
use crate::code_model::{CodeNamespace, Member};

/// Adds a generated doc comment to every type and member that has none.
/// Already documented declarations are left untouched, which makes the step
/// idempotent.
#[derive(Debug, Default)]
pub struct AddDocComments;

impl CodeModifier for AddDocComments {
    fn name(&self) -> &str {
        "add_doc_comments"
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for decl in &mut namespace.types {
            if decl.comments.is_empty() {
                decl.comments
                    .push(format!("Generated from the schema type `{}`.", decl.name));
            }
            for member in &mut decl.members {
                if member.comments().is_empty() {
                    let line = match &*member {
                        Member::Constructor(_) => "Creates a default instance.".to_string(),
                        other => format!("Generated member `{}`.", other.name()),
                    };
                    member.comments_mut().push(line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{Field, MemberModifiers, TypeDeclaration, TypeRef};

    fn sample() -> CodeNamespace {
        let mut ns = CodeNamespace::new("generated");
        let mut decl = TypeDeclaration::class("Person");
        decl.members.push(Member::Field(Field {
            name: "name".into(),
            ty: TypeRef::new("String"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
        }));
        ns.types.push(decl);
        ns
    }

    #[test]
    fn test_adds_comments_where_missing() {
        let mut ns = sample();
        AddDocComments.execute(&mut ns);

        assert!(!ns.types[0].comments.is_empty());
        assert!(!ns.types[0].members[0].comments().is_empty());
    }

    #[test]
    fn test_constructor_gets_dedicated_line() {
        use crate::code_model::Constructor;

        let mut ns = sample();
        ns.types[0].members.push(Member::Constructor(Constructor {
            parameters: Vec::new(),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
            statements: Vec::new(),
        }));

        AddDocComments.execute(&mut ns);

        assert_eq!(
            ns.types[0].members[0].comments(),
            ["Generated member `name`.".to_string()]
        );
        assert_eq!(
            ns.types[0].members[1].comments(),
            ["Creates a default instance.".to_string()]
        );
    }

    #[test]
    fn test_idempotent() {
        let mut ns = sample();
        AddDocComments.execute(&mut ns);
        let once = ns.clone();
        AddDocComments.execute(&mut ns);
        assert_eq!(ns, once);
    }

    #[test]
    fn test_existing_comments_preserved() {
        let mut ns = sample();
        ns.types[0].comments.push("Hand-written.".into());
        AddDocComments.execute(&mut ns);
        assert_eq!(ns.types[0].comments, vec!["Hand-written.".to_string()]);
    }
}
