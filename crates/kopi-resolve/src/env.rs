use std::collections::HashMap;

use smol_str::SmolStr;

use crate::types::{PrimitiveType, TypeRef, WildcardBound};

const OBJECT: &str = "java.lang.Object";

/// Class hierarchy queries the resolver needs from the host.
///
/// Only [`TypeEnv::supertypes`] is required; assignability is derived from it.
pub trait TypeEnv {
    /// Direct supertypes (superclass and interfaces) of `class`, as qualified names.
    fn supertypes(&self, class: &str) -> Vec<SmolStr>;

    /// Map a name as written to its qualified form.
    fn qualify<'a>(&self, name: &'a str) -> std::borrow::Cow<'a, str> {
        std::borrow::Cow::Borrowed(name)
    }

    /// Upper bound of a type variable; `java.lang.Object` when unknown.
    fn type_var_bound(&self, _name: &str) -> Option<TypeRef> {
        None
    }

    fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        let sub = self.qualify(sub).into_owned();
        let sup = self.qualify(sup).into_owned();
        if sub == sup || sup == OBJECT {
            return true;
        }

        let mut seen = vec![SmolStr::new(&sub)];
        let mut stack = vec![SmolStr::new(&sub)];
        while let Some(current) = stack.pop() {
            for parent in self.supertypes(&current) {
                let parent = SmolStr::new(self.qualify(&parent));
                if parent == sup {
                    return true;
                }
                if !seen.contains(&parent) {
                    seen.push(parent.clone());
                    stack.push(parent);
                }
            }
        }
        false
    }

    /// Whether a value of type `from` may be passed where `to` is expected (JLS 5.3, loosely).
    ///
    /// Erroneous types are never assignable in either direction. Type-variable bounds are
    /// followed at most [`MAX_BOUND_DEPTH`] times, so cyclic bounds answer `false`.
    fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        assignable(self, from, to, MAX_BOUND_DEPTH)
    }

    /// Type argument containment (JLS 4.5.1): whether `formal` contains `actual`.
    fn contains_type_argument(&self, formal: &TypeRef, actual: &TypeRef) -> bool {
        contains(self, formal, actual, MAX_BOUND_DEPTH)
    }
}

/// How many type-variable bounds one assignability check may follow.
pub const MAX_BOUND_DEPTH: u8 = 32;

fn assignable<E: TypeEnv + ?Sized>(env: &E, from: &TypeRef, to: &TypeRef, depth: u8) -> bool {
    if from.is_error() || to.is_error() {
        return false;
    }
    if from == to {
        return true;
    }

    match (from, to) {
        (TypeRef::Primitive(f), TypeRef::Primitive(t)) => f.widens_to(*t),
        // Boxing, then widening reference conversion.
        (TypeRef::Primitive(f), TypeRef::Class { name, .. }) => {
            env.is_subclass(f.boxed_name(), name)
        }
        // Unboxing, then widening primitive conversion.
        (TypeRef::Class { name, .. }, TypeRef::Primitive(t)) => {
            PrimitiveType::from_boxed_name(&env.qualify(name))
                .is_some_and(|unboxed| unboxed.widens_to(*t))
        }
        (TypeRef::Null, to) => !to.is_primitive(),
        (_, TypeRef::Null) | (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
        (TypeRef::TypeVar(f), TypeRef::TypeVar(t)) if f == t => true,
        (TypeRef::TypeVar(_), _) if depth == 0 => {
            tracing::debug!(target: "kopi.resolve", from = %from, "type variable bounds too deep");
            false
        }
        (TypeRef::TypeVar(f), TypeRef::TypeVar(_)) => env
            .type_var_bound(f)
            .is_some_and(|bound| assignable(env, &bound, to, depth - 1)),
        (TypeRef::TypeVar(f), _) => {
            let bound = env
                .type_var_bound(f)
                .unwrap_or_else(|| TypeRef::class(OBJECT));
            assignable(env, &bound, to, depth - 1)
        }
        (_, TypeRef::TypeVar(_)) => false,
        (TypeRef::Array(_), TypeRef::Class { name, .. }) => {
            let name = env.qualify(name);
            matches!(
                name.as_ref(),
                OBJECT | "java.lang.Cloneable" | "java.io.Serializable"
            )
        }
        (TypeRef::Array(f), TypeRef::Array(t)) => {
            if f.is_primitive() || t.is_primitive() {
                f == t
            } else {
                assignable(env, f, t, depth)
            }
        }
        (TypeRef::Class { name: f, args: fa }, TypeRef::Class { name: t, args: ta }) => {
            if !env.is_subclass(f, t) {
                return false;
            }
            // Raw types on either side convert unchecked. Type arguments are only compared
            // between identical erasures; supertypes are tracked by name only.
            if fa.is_empty() || ta.is_empty() || env.qualify(f) != env.qualify(t) {
                return true;
            }
            fa.len() == ta.len()
                && fa
                    .iter()
                    .zip(ta)
                    .all(|(actual, formal)| contains(env, formal, actual, depth))
        }
        _ => false,
    }
}

fn contains<E: TypeEnv + ?Sized>(env: &E, formal: &TypeRef, actual: &TypeRef, depth: u8) -> bool {
    match formal {
        TypeRef::Wildcard(WildcardBound::Unbounded) => true,
        TypeRef::Wildcard(WildcardBound::Extends(bound)) => match actual {
            TypeRef::Wildcard(WildcardBound::Extends(inner)) => {
                assignable(env, inner, bound, depth)
            }
            TypeRef::Wildcard(_) => false,
            actual => assignable(env, actual, bound, depth),
        },
        TypeRef::Wildcard(WildcardBound::Super(bound)) => match actual {
            TypeRef::Wildcard(WildcardBound::Super(inner)) => assignable(env, bound, inner, depth),
            TypeRef::Wildcard(_) => false,
            actual => assignable(env, bound, actual, depth),
        },
        formal => formal == actual,
    }
}

/// An in-memory [`TypeEnv`] preloaded with the `java.lang` core and a few collection types.
///
/// Simple names of known classes qualify automatically, so `String` and `java.lang.String` are
/// interchangeable.
#[derive(Debug, Clone, Default)]
pub struct BasicTypeEnv {
    supertypes: HashMap<SmolStr, Vec<SmolStr>>,
    simple_names: HashMap<SmolStr, SmolStr>,
    type_var_bounds: HashMap<SmolStr, TypeRef>,
}

impl BasicTypeEnv {
    pub fn new() -> Self {
        let mut env = Self::default();
        let lang = [
            ("java.lang.Object", &[][..]),
            ("java.lang.CharSequence", &[][..]),
            ("java.lang.Comparable", &[][..]),
            ("java.lang.Cloneable", &[][..]),
            ("java.io.Serializable", &[][..]),
            (
                "java.lang.String",
                &["java.lang.CharSequence", "java.lang.Comparable", "java.io.Serializable"][..],
            ),
            ("java.lang.Number", &["java.io.Serializable"][..]),
            ("java.lang.Boolean", &["java.lang.Comparable", "java.io.Serializable"][..]),
            ("java.lang.Character", &["java.lang.Comparable", "java.io.Serializable"][..]),
            ("java.lang.Byte", &["java.lang.Number", "java.lang.Comparable"][..]),
            ("java.lang.Short", &["java.lang.Number", "java.lang.Comparable"][..]),
            ("java.lang.Integer", &["java.lang.Number", "java.lang.Comparable"][..]),
            ("java.lang.Long", &["java.lang.Number", "java.lang.Comparable"][..]),
            ("java.lang.Float", &["java.lang.Number", "java.lang.Comparable"][..]),
            ("java.lang.Double", &["java.lang.Number", "java.lang.Comparable"][..]),
            ("java.lang.Iterable", &[][..]),
            ("java.util.Collection", &["java.lang.Iterable"][..]),
            ("java.util.List", &["java.util.Collection"][..]),
            ("java.util.Set", &["java.util.Collection"][..]),
            ("java.util.ArrayList", &["java.util.List", "java.lang.Cloneable"][..]),
            ("java.util.Map", &[][..]),
            ("java.util.HashMap", &["java.util.Map", "java.lang.Cloneable"][..]),
        ];
        for (class, parents) in lang {
            env.add_class(class, parents.iter().copied());
        }
        env
    }

    /// Register `class` with its direct supertypes. Its simple name becomes an alias unless
    /// another class already claimed it.
    pub fn add_class<'a>(
        &mut self,
        class: &str,
        supertypes: impl IntoIterator<Item = &'a str>,
    ) -> &mut Self {
        let class = SmolStr::new(class);
        let simple = class.rsplit('.').next().unwrap_or(&class);
        if simple != class.as_str() {
            self.simple_names
                .entry(SmolStr::new(simple))
                .or_insert_with(|| class.clone());
        }
        self.supertypes
            .insert(class, supertypes.into_iter().map(SmolStr::new).collect());
        self
    }

    pub fn add_type_var(&mut self, name: &str, bound: TypeRef) -> &mut Self {
        self.type_var_bounds.insert(SmolStr::new(name), bound);
        self
    }
}

impl TypeEnv for BasicTypeEnv {
    fn supertypes(&self, class: &str) -> Vec<SmolStr> {
        self.supertypes
            .get(self.qualify(class).as_ref())
            .cloned()
            .unwrap_or_default()
    }

    fn qualify<'a>(&self, name: &'a str) -> std::borrow::Cow<'a, str> {
        match self.simple_names.get(name) {
            Some(qualified) => std::borrow::Cow::Owned(qualified.to_string()),
            None => std::borrow::Cow::Borrowed(name),
        }
    }

    fn type_var_bound(&self, name: &str) -> Option<TypeRef> {
        self.type_var_bounds.get(name).cloned()
    }
}
