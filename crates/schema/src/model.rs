use graphql_parser::schema::Type;

/// Field type as written in SDL, wrappers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

/// Result of peeling every wrapper off a [`TypeRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrappedType {
    pub name: String,
    pub is_list: bool,
    pub is_non_null: bool,
}

impl TypeRef {
    /// Walk wrappers outer-to-inner until the named type.
    ///
    /// Any `NonNull` along the way sets `is_non_null`, any `List` sets `is_list`.
    pub fn unwrap(&self) -> UnwrappedType {
        let mut is_list = false;
        let mut is_non_null = false;
        let mut current = self;
        loop {
            match current {
                TypeRef::NonNull(inner) => {
                    is_non_null = true;
                    current = inner;
                }
                TypeRef::List(inner) => {
                    is_list = true;
                    current = inner;
                }
                TypeRef::Named(name) => {
                    return UnwrappedType {
                        name: name.clone(),
                        is_list,
                        is_non_null,
                    };
                }
            }
        }
    }

    pub fn named(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named(),
        }
    }
}

impl<'a> From<&Type<'a, String>> for TypeRef {
    fn from(ty: &Type<'a, String>) -> Self {
        match ty {
            Type::NamedType(name) => TypeRef::Named(name.clone()),
            Type::ListType(inner) => TypeRef::List(Box::new(TypeRef::from(inner.as_ref()))),
            Type::NonNullType(inner) => TypeRef::NonNull(Box::new(TypeRef::from(inner.as_ref()))),
        }
    }
}

/// Structural kind of an SDL type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Scalar => "scalar",
            DeclKind::Object => "type",
            DeclKind::Interface => "interface",
            DeclKind::Union => "union",
            DeclKind::Enum => "enum",
            DeclKind::InputObject => "input",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub description: Option<String>,
}

/// One type after definitions and `extend` blocks are merged.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: DeclKind,
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub members: Vec<String>,
    /// Set once a non-extension definition has been seen
    pub defined: bool,
}

impl TypeDecl {
    pub fn new(kind: DeclKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            fields: Vec::new(),
            members: Vec::new(),
            defined: false,
        }
    }
}
