//! Host type inference seam

use sg_core::{TemplateExpression, TypeArgument};

/// Static type information about host-language values used by templates.
///
/// Both methods return `None` when the type cannot be inferred; the checks
/// depending on it are then skipped with a warning.
pub trait TypeInference {
    /// Property names of the value wrapped by a spread expression
    fn infer_spread_properties(&self, expression: &TemplateExpression) -> Option<Vec<String>>;

    /// Property names of the row type asserted by a query's type argument
    fn infer_asserted_result_shape(&self, type_argument: &TypeArgument) -> Option<Vec<String>>;
}

/// Uses the property lists the host extractor recorded in the manifest
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredTypes;

impl TypeInference for DeclaredTypes {
    fn infer_spread_properties(&self, expression: &TemplateExpression) -> Option<Vec<String>> {
        expression.properties.clone()
    }

    fn infer_asserted_result_shape(&self, type_argument: &TypeArgument) -> Option<Vec<String>> {
        type_argument.properties.clone()
    }
}
