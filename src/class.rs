//! Runtime class descriptions standing in for reflection.
//!
//! A [`ClassInfo`] records what a scan would find on a domain type: its
//! fields with their declared types and markers, its callable methods and its
//! class-level markers. Classes and schema classes are registered by name in a
//! [`TypeRegistry`] once at startup.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::marker::{FieldMarker, LinkMarker, ResourceMarker};
use crate::resolver::SchemaConstructor;
use crate::schema::GenericSchema;

/// Name under which [`GenericSchema`] is always registered.
pub const GENERIC_SCHEMA: &str = "GenericSchema";

/// A related resource handed to the encoder.
pub type ResourceRef = Arc<dyn Any + Send + Sync>;

/// Type-erased zero-argument method call. Returns `None` when the receiver
/// is not an instance of the declaring class.
pub type Invoker = Arc<dyn Fn(&dyn Any) -> Option<FieldValue> + Send + Sync>;

/// Value produced by a getter.
pub enum FieldValue {
    Json(Value),
    Resource(ResourceRef),
    Resources(Vec<ResourceRef>),
    /// Evaluated only when the value is actually read.
    Deferred(Box<dyn FnOnce() -> FieldValue>),
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Json(Value::Null)
    }

    pub fn resource<T: Any + Send + Sync>(resource: Arc<T>) -> Self {
        FieldValue::Resource(resource)
    }

    pub fn resources<T: Any + Send + Sync>(resources: impl IntoIterator<Item = Arc<T>>) -> Self {
        FieldValue::Resources(
            resources
                .into_iter()
                .map(|r| r as ResourceRef)
                .collect(),
        )
    }

    pub fn deferred(f: impl FnOnce() -> FieldValue + 'static) -> Self {
        FieldValue::Deferred(Box::new(f))
    }

    /// Evaluate deferred values until a concrete one remains.
    pub fn force(self) -> FieldValue {
        let mut value = self;
        while let FieldValue::Deferred(f) = value {
            value = f();
        }
        value
    }

    /// The JSON value, forcing deferred values first.
    pub fn into_json(self) -> Option<Value> {
        match self.force() {
            FieldValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
            FieldValue::Resource(_) => f.write_str("Resource(..)"),
            FieldValue::Resources(r) => write!(f, "Resources({} item(s))", r.len()),
            FieldValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

macro_rules! json_field_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Json(Value::from(value))
                }
            }
        )*
    };
}

json_field_value!(Value, String, &str, bool, i32, i64, u32, u64, usize, f64);

/// Declared type of a field, as far as accessor defaulting cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    Object,
    Collection,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub ty: FieldType,
    /// Class that declares the field (an ancestor for inherited fields).
    pub declared_by: String,
    pub markers: Vec<FieldMarker>,
}

#[derive(Clone)]
pub struct MethodInfo {
    pub name: String,
    pub declared_by: String,
    pub visibility: Visibility,
    pub arity: usize,
    invoker: Option<Invoker>,
}

impl MethodInfo {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Call the method on `receiver`. `None` for signature-only methods or a
    /// receiver of another type.
    pub fn invoke(&self, receiver: &dyn Any) -> Option<FieldValue> {
        self.invoker.as_ref().and_then(|invoke| (**invoke)(receiver))
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("declared_by", &self.declared_by)
            .field("visibility", &self.visibility)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Scan result for one domain type.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    name: String,
    type_id: TypeId,
    parent: Option<String>,
    resource: Option<ResourceMarker>,
    links: Vec<LinkMarker>,
    meta: Vec<(String, Value)>,
    fields: Vec<FieldInfo>,
    methods: BTreeMap<String, MethodInfo>,
}

impl ClassInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Class-level resource marker, if the class is marked as a resource.
    pub fn resource_marker(&self) -> Option<&ResourceMarker> {
        self.resource.as_ref()
    }

    /// Standalone class-level link markers.
    pub fn link_markers(&self) -> &[LinkMarker] {
        &self.links
    }

    /// Standalone class-level meta markers, in declaration order.
    pub fn meta_markers(&self) -> &[(String, Value)] {
        &self.meta
    }

    /// Declared fields, inherited ones first.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        // Later declarations shadow inherited ones.
        self.fields.iter().rev().find(|f| f.name == name)
    }

    /// Method declared on the class or inherited from an ancestor.
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }

    pub fn is_instance(&self, value: &dyn Any) -> bool {
        value.type_id() == self.type_id
    }
}

/// Fluent construction of a [`ClassInfo`] for `T`.
///
/// ```
/// use jsonapi_metadata::{ClassBuilder, FieldMarker, FieldType, ResourceMarker};
///
/// struct Tag { label: String }
///
/// let class = ClassBuilder::<Tag>::new("blog::Tag")
///     .resource(ResourceMarker::new())
///     .field("label", FieldType::String, [FieldMarker::id()])
///     .getter("getLabel", |t| t.label.clone().into())
///     .build();
/// assert_eq!(class.name(), "blog::Tag");
/// ```
pub struct ClassBuilder<T> {
    info: ClassInfo,
    _type: PhantomData<fn(&T)>,
}

impl<T: Any> ClassBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ClassInfo {
                name: name.into(),
                type_id: TypeId::of::<T>(),
                parent: None,
                resource: None,
                links: Vec::new(),
                meta: Vec::new(),
                fields: Vec::new(),
                methods: BTreeMap::new(),
            },
            _type: PhantomData,
        }
    }

    /// Inherit the fields and methods of an already built `parent`.
    ///
    /// `project` reaches the parent part of a `T`; inherited methods are
    /// invoked on it.
    pub fn extends<P, F>(mut self, parent: &ClassInfo, project: F) -> Self
    where
        P: Any,
        F: Fn(&T) -> &P + Send + Sync + 'static,
    {
        self.info.parent = Some(parent.name.clone());
        let mut fields = parent.fields.clone();
        fields.append(&mut self.info.fields);
        self.info.fields = fields;

        let project = Arc::new(project);
        for (name, method) in &parent.methods {
            let invoker = method.invoker.clone().map(|parent_invoke| -> Invoker {
                let project = Arc::clone(&project);
                Arc::new(move |receiver: &dyn Any| {
                    let child = receiver.downcast_ref::<T>()?;
                    let parent: &dyn Any = (*project)(child);
                    (*parent_invoke)(parent)
                })
            });
            self.info
                .methods
                .entry(name.clone())
                .or_insert_with(|| MethodInfo {
                    invoker,
                    ..method.clone()
                });
        }
        self
    }

    pub fn resource(mut self, marker: ResourceMarker) -> Self {
        self.info.resource = Some(marker);
        self
    }

    pub fn link(mut self, marker: LinkMarker) -> Self {
        self.info.links.push(marker);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.info.meta.push((key.into(), value.into()));
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        markers: impl IntoIterator<Item = FieldMarker>,
    ) -> Self {
        self.info.fields.push(FieldInfo {
            name: name.into(),
            ty,
            declared_by: self.info.name.clone(),
            markers: markers.into_iter().collect(),
        });
        self
    }

    /// Register a public zero-argument getter.
    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        let invoker: Invoker =
            Arc::new(move |receiver: &dyn Any| receiver.downcast_ref::<T>().map(&getter));
        self.insert_method(name.into(), Visibility::Public, 0, Some(invoker));
        self
    }

    /// Register a public one-argument setter. Setters are never invoked.
    pub fn setter(mut self, name: impl Into<String>) -> Self {
        self.insert_method(name.into(), Visibility::Public, 1, None);
        self
    }

    /// Register a method signature that cannot be used as a getter.
    pub fn method(mut self, name: impl Into<String>, visibility: Visibility, arity: usize) -> Self {
        self.insert_method(name.into(), visibility, arity, None);
        self
    }

    pub fn build(self) -> ClassInfo {
        self.info
    }

    fn insert_method(
        &mut self,
        name: String,
        visibility: Visibility,
        arity: usize,
        invoker: Option<Invoker>,
    ) {
        let method = MethodInfo {
            name: name.clone(),
            declared_by: self.info.name.clone(),
            visibility,
            arity,
            invoker,
        };
        self.info.methods.insert(name, method);
    }
}

/// Every class and schema class known to the process, keyed by name.
#[derive(Clone)]
pub struct TypeRegistry {
    classes: BTreeMap<String, Arc<ClassInfo>>,
    by_type: HashMap<TypeId, String>,
    schemas: BTreeMap<String, SchemaConstructor>,
}

impl TypeRegistry {
    /// Registry containing only the builtin [`GenericSchema`].
    pub fn new() -> Self {
        let mut registry = Self {
            classes: BTreeMap::new(),
            by_type: HashMap::new(),
            schemas: BTreeMap::new(),
        };
        registry.register_schema(
            GENERIC_SCHEMA,
            SchemaConstructor::metadata_aware(|ctx, metadata, group| {
                Box::new(GenericSchema::new(ctx, metadata, group))
            }),
        );
        registry
    }

    pub fn register_class(&mut self, class: ClassInfo) -> &mut Self {
        self.by_type.insert(class.type_id, class.name.clone());
        self.classes.insert(class.name.clone(), Arc::new(class));
        self
    }

    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.register_class(class);
        self
    }

    pub fn register_schema(
        &mut self,
        name: impl Into<String>,
        constructor: SchemaConstructor,
    ) -> &mut Self {
        self.schemas.insert(name.into(), constructor);
        self
    }

    pub fn with_schema(mut self, name: impl Into<String>, constructor: SchemaConstructor) -> Self {
        self.register_schema(name, constructor);
        self
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassInfo>> {
        self.classes.get(name)
    }

    pub fn class_of(&self, type_id: TypeId) -> Option<&Arc<ClassInfo>> {
        self.by_type.get(&type_id).and_then(|name| self.classes.get(name))
    }

    /// Registered classes in name order.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassInfo>> {
        self.classes.values()
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaConstructor> {
        self.schemas.get(name)
    }

    /// Whether `name` refers to any registered type, class or schema.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.schemas.contains_key(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .finish()
    }
}
