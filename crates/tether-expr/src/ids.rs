macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Get the inner u32 value.
            pub fn inner(self) -> u32 {
                self.0
            }

            /// Create an ID from a u32 value.
            pub fn new(value: u32) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id_type!(VariableId);
define_id_type!(ParamId);
define_id_type!(ConstraintId);
define_id_type!(SosId);
define_id_type!(ObjectiveId);
define_id_type!(NamedExprId);
define_id_type!(BlockId);

// Expression handles are compared by identity: a rebuilt but structurally
// equal tree gets a new ExprId.
define_id_type!(ExprId);

#[cfg(test)]
mod tests {
    use super::{ExprId, VariableId};

    #[test]
    fn test_variable_id_roundtrip() {
        let id = VariableId::new(7);
        assert_eq!(id.inner(), 7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn test_expr_ids_order_by_allocation() {
        assert!(ExprId::new(1) < ExprId::new(2));
        assert_ne!(ExprId::new(1), ExprId::new(2));
    }
}
