//! Property flag steps.
//!
//! Each step takes a list of qualified property names, `Type.Property` or
//! `Type.*`, and adjusts the matching properties. The matcher is shared:
//! the type segment must match the declaring type exactly, the property
//! segment matches by name or wildcard.

use super::CodeModifier;
use crate::code_model::{AttributeDecl, CodeNamespace, Literal, Member, Property};
use crate::error::AppResult;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct Options {
    #[serde(default)]
    properties: Vec<String>,
}

pub(super) fn matches(entry: &str, type_name: &str, property_name: &str) -> bool {
    let Some((ty, prop)) = entry.rsplit_once('.') else {
        return false;
    };
    ty == type_name && (prop == "*" || prop == property_name)
}

fn for_each_match(
    options: &Options,
    namespace: &mut CodeNamespace,
    mut apply: impl FnMut(&mut Property),
) {
    for decl in &mut namespace.types {
        let type_name = decl.name.clone();
        for member in &mut decl.members {
            if let Member::Property(property) = member {
                if options
                    .properties
                    .iter()
                    .any(|e| matches(e, &type_name, &property.name))
                {
                    apply(property);
                }
            }
        }
    }
}

macro_rules! options_step {
    ($ty:ident, $step_name:literal, $apply:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Default)]
        pub struct $ty {
            options: Options,
        }

        impl CodeModifier for $ty {
            fn name(&self) -> &str {
                $step_name
            }

            fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
                if !options.is_null() {
                    self.options =
                        serde_json::from_value(options).map_err(|e| e.to_string())?;
                }
                Ok(())
            }

            fn execute(&self, namespace: &mut CodeNamespace) {
                for_each_match(&self.options, namespace, $apply);
            }
        }
    };
}

options_step!(
    BrowsableProperty,
    "browsable_property",
    |property| {
        if !property.attributes.iter().any(|a| a.name == "Browsable") {
            property.attributes.push(
                AttributeDecl::new("Browsable").with_positional(Literal::Bool(false)),
            );
        }
    },
    "Hides matching properties from designers via `Browsable(false)`."
);

options_step!(
    OverrideProperty,
    "override_property",
    |property| property.modifiers.is_override = true,
    "Marks matching properties as overriding a base declaration."
);

options_step!(
    VirtualProperty,
    "virtual_property",
    |property| property.modifiers.is_virtual = true,
    "Marks matching properties as overridable."
);
