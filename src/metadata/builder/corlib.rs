//! A minimal `mscorlib` for models that are built by hand.
//!
//! Only the definitions the linker reasons about by name are created: the root types, the
//! primitives (so primitive references resolve), the delegate and attribute bases and the
//! serialization constructor parameter types.

use strum::IntoEnumIterator;

use crate::metadata::{
    builder::ModelBuilder,
    token::Token,
    typesystem::{CilPrimitiveKind, TypeAttributes, TypeReference},
};

/// Name of the core library assembly
pub const CORLIB_NAME: &str = "mscorlib";

/// Tokens of the well-known corlib definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorLib {
    /// The `mscorlib` assembly
    pub assembly: Token,
    /// `System.Object`
    pub object_type: Token,
    /// `System.Object::.ctor()`
    pub object_ctor: Token,
    /// `System.Object::ToString()`
    pub object_to_string: Token,
    /// `System.Object::Equals(object)`
    pub object_equals: Token,
    /// `System.Object::GetHashCode()`
    pub object_get_hash_code: Token,
    /// `System.Object::Finalize()`
    pub object_finalize: Token,
    /// `System.ValueType`
    pub value_type_type: Token,
    /// `System.Enum`
    pub enum_type: Token,
    /// `System.String`
    pub string_type: Token,
    /// `System.Type`
    pub system_type: Token,
    /// `System.Attribute`
    pub attribute_type: Token,
    /// `System.Attribute::.ctor()`
    pub attribute_ctor: Token,
    /// `System.Delegate`
    pub delegate_type: Token,
    /// `System.MulticastDelegate`
    pub multicast_delegate_type: Token,
    /// `System.Exception`
    pub exception_type: Token,
    /// `System.Exception::.ctor()`
    pub exception_ctor: Token,
    /// `System.Runtime.Serialization.SerializationInfo`
    pub serialization_info_type: Token,
    /// `System.Runtime.Serialization.StreamingContext`
    pub streaming_context_type: Token,
}

impl CorLib {
    pub(super) fn create(builder: &mut ModelBuilder) -> CorLib {
        let assembly = builder.assembly(CORLIB_NAME);
        builder.set_corlib(assembly);

        let object_type = builder.class(assembly, "System", "Object").build();
        let object = TypeReference::Definition(object_type);
        let object_ctor = builder.constructor(object_type).build();
        let object_to_string = builder
            .method(object_type, "ToString")
            .virtual_()
            .newslot()
            .returns(CilPrimitiveKind::String.into())
            .body(|b| b.ldnull().ret())
            .build();
        let object_equals = builder
            .method(object_type, "Equals")
            .virtual_()
            .newslot()
            .param("obj", CilPrimitiveKind::Object.into())
            .returns(CilPrimitiveKind::Boolean.into())
            .body(|b| b.ldc_i4(0).ret())
            .build();
        let object_get_hash_code = builder
            .method(object_type, "GetHashCode")
            .virtual_()
            .newslot()
            .returns(CilPrimitiveKind::I4.into())
            .body(|b| b.ldc_i4(0).ret())
            .build();
        let object_finalize = builder
            .method(object_type, "Finalize")
            .family()
            .virtual_()
            .newslot()
            .body(|b| b.ret())
            .build();

        let abstract_class = TypeAttributes::PUBLIC | TypeAttributes::ABSTRACT;
        let value_type_type = builder
            .type_def(assembly, "System", "ValueType", abstract_class)
            .extends(object.clone())
            .build();
        let enum_type = builder
            .type_def(assembly, "System", "Enum", abstract_class)
            .extends(TypeReference::Definition(value_type_type))
            .build();

        // Void has no value type semantics but still needs a definition to resolve to
        let value_primitives = CilPrimitiveKind::iter()
            .filter(|kind| !matches!(kind, CilPrimitiveKind::Object | CilPrimitiveKind::String));
        for kind in value_primitives {
            builder
                .class(assembly, "System", kind.name())
                .flags(TypeAttributes::SEALED)
                .extends(TypeReference::Definition(value_type_type))
                .build();
        }

        let string_type = builder
            .class(assembly, "System", "String")
            .flags(TypeAttributes::SEALED)
            .extends(object.clone())
            .build();
        let system_type = builder
            .type_def(assembly, "System", "Type", abstract_class)
            .extends(object.clone())
            .build();

        let attribute_type = builder
            .type_def(assembly, "System", "Attribute", abstract_class)
            .extends(object.clone())
            .build();
        let attribute_ctor = builder.constructor(attribute_type).family().build();

        let delegate_type = builder
            .type_def(assembly, "System", "Delegate", abstract_class)
            .extends(object.clone())
            .build();
        let multicast_delegate_type = builder
            .type_def(assembly, "System", "MulticastDelegate", abstract_class)
            .extends(TypeReference::Definition(delegate_type))
            .build();

        let exception_type = builder
            .class(assembly, "System", "Exception")
            .flags(TypeAttributes::SERIALIZABLE)
            .extends(object.clone())
            .build();
        let exception_ctor = builder.constructor(exception_type).build();

        let serialization_info_type = builder
            .class(assembly, "System.Runtime.Serialization", "SerializationInfo")
            .flags(TypeAttributes::SEALED)
            .extends(object)
            .build();
        let streaming_context_type = builder
            .class(assembly, "System.Runtime.Serialization", "StreamingContext")
            .flags(TypeAttributes::SEALED)
            .extends(TypeReference::Definition(value_type_type))
            .build();

        builder
            .method(system_type, "GetTypeFromHandle")
            .static_()
            .returns(TypeReference::Definition(system_type))
            .body(|b| b.ldnull().ret())
            .build();

        CorLib {
            assembly,
            object_type,
            object_ctor,
            object_to_string,
            object_equals,
            object_get_hash_code,
            object_finalize,
            value_type_type,
            enum_type,
            string_type,
            system_type,
            attribute_type,
            attribute_ctor,
            delegate_type,
            multicast_delegate_type,
            exception_type,
            exception_ctor,
            serialization_info_type,
            streaming_context_type,
        }
    }

    /// `System.Object`
    #[must_use]
    pub fn object(&self) -> TypeReference {
        TypeReference::Definition(self.object_type)
    }

    /// `System.ValueType`
    #[must_use]
    pub fn value_type(&self) -> TypeReference {
        TypeReference::Definition(self.value_type_type)
    }

    /// `System.Enum`
    #[must_use]
    pub fn enum_base(&self) -> TypeReference {
        TypeReference::Definition(self.enum_type)
    }

    /// `System.String`
    #[must_use]
    pub fn string(&self) -> TypeReference {
        TypeReference::Primitive(CilPrimitiveKind::String)
    }

    /// `System.Type`
    #[must_use]
    pub fn type_(&self) -> TypeReference {
        TypeReference::Definition(self.system_type)
    }

    /// `System.Attribute`
    #[must_use]
    pub fn attribute(&self) -> TypeReference {
        TypeReference::Definition(self.attribute_type)
    }

    /// `System.MulticastDelegate`
    #[must_use]
    pub fn multicast_delegate(&self) -> TypeReference {
        TypeReference::Definition(self.multicast_delegate_type)
    }

    /// `System.Exception`
    #[must_use]
    pub fn exception(&self) -> TypeReference {
        TypeReference::Definition(self.exception_type)
    }

    /// `System.Runtime.Serialization.SerializationInfo`
    #[must_use]
    pub fn serialization_info(&self) -> TypeReference {
        TypeReference::Definition(self.serialization_info_type)
    }

    /// `System.Runtime.Serialization.StreamingContext`
    #[must_use]
    pub fn streaming_context(&self) -> TypeReference {
        TypeReference::Definition(self.streaming_context_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_resolve() {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let model = builder.finish();

        assert_eq!(model.corlib(), Some(corlib.assembly));
        let int32 = model
            .resolve_type(&CilPrimitiveKind::I4.into())
            .unwrap();
        assert_eq!(model.full_name(int32), "System.Int32");
        assert!(model.is_value_type(int32));
        assert!(!model.is_value_type(corlib.string_type));
        assert!(!model.is_value_type(corlib.enum_type));
        assert_eq!(
            model.resolve_type(&corlib.string()).unwrap(),
            corlib.string_type
        );
    }

    #[test]
    fn test_corlib_created_once() {
        let mut builder = ModelBuilder::new();
        let first = builder.corlib();
        let second = builder.corlib();
        assert_eq!(first, second);
        assert_eq!(builder.finish().assemblies().count(), 1);
    }
}
