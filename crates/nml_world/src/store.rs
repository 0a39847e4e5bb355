//! The storage collaborator seen by a running script.
//!
//! A [`Vm`] suspends on every [`Request`]; whoever drives it answers through
//! an [`ObjectStore`]. The trait is async so that stores backed by a network
//! or a database can be driven the same way as [`MemoryStore`](crate::MemoryStore).

use async_trait::async_trait;
use nml_foundation::{ObjectId, RuntimeError, Value};
use nml_language::{CallArgs, Reply, Request, Vm, code_to_ast};

/// Object storage and verb lookup for scripts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads a property, following the parent chain.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] for an unknown object and
    /// [`RuntimeError::PropNotFound`] when no object in the chain has the
    /// property.
    async fn get_prop(&self, object: ObjectId, name: &str) -> Result<Value, RuntimeError>;

    /// Writes a property on the object itself.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] for an unknown object.
    async fn set_prop(&self, object: ObjectId, name: &str, value: Value)
    -> Result<(), RuntimeError>;

    /// Resolves a `##NAME` alias.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAlias`] when the alias is not registered.
    async fn resolve_alias(&self, name: &str) -> Result<ObjectId, RuntimeError>;

    /// Returns the source of a verb, following the parent chain.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::VerbNotFound`] when no object in the chain defines it.
    async fn find_verb(&self, object: ObjectId, verb: &str) -> Result<String, RuntimeError>;

    /// Compiles the verb a call names into a fresh VM with the call's
    /// context locals set.
    ///
    /// # Errors
    ///
    /// Lookup errors from [`find_verb`](Self::find_verb), and
    /// [`RuntimeError::Compile`] when the verb does not compile.
    async fn resolve_and_call(&self, object: ObjectId, args: &CallArgs) -> Result<Vm, RuntimeError> {
        let source = self.find_verb(object, &args.verb).await?;
        let ast = code_to_ast(&source)?;
        Ok(Vm::for_call(object, ast, args))
    }

    /// Answers a [`Request::Call`].
    ///
    /// The default delegates to a compiled verb frame. Stores that handle
    /// some verbs natively override this and answer with [`Reply::Value`].
    ///
    /// # Errors
    ///
    /// Same as [`resolve_and_call`](Self::resolve_and_call).
    async fn dispatch_call(&self, object: ObjectId, args: CallArgs) -> Result<Reply, RuntimeError> {
        let vm = self.resolve_and_call(object, &args).await?;
        Ok(Reply::Frame(Box::new(vm)))
    }
}

/// Answers one VM request from `store`.
///
/// # Errors
///
/// Whatever the store returns. The caller normally hands the error back to
/// the VM through [`Vm::resume`] so the script sees it on its next step.
pub async fn serve<S>(store: &S, request: Request) -> Result<Reply, RuntimeError>
where
    S: ObjectStore + ?Sized,
{
    match request {
        Request::GetProp { object, name } => store.get_prop(object, &name).await.map(Reply::Value),
        Request::SetProp {
            object,
            name,
            value,
        } => store
            .set_prop(object, &name, value)
            .await
            .map(|()| Reply::Done),
        Request::ResolveAlias { name } => store
            .resolve_alias(&name)
            .await
            .map(|id| Reply::Value(Value::Object(id))),
        Request::Call { object, args } => store.dispatch_call(object, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use futures::executor::block_on;
    use nml_foundation::SyntaxError;

    fn store() -> (MemoryStore, ObjectId) {
        let store = MemoryStore::with_seed(7);
        let id = store.create(None);
        (store, id)
    }

    #[test]
    fn serve_get_and_set() {
        let (store, id) = store();
        let reply = block_on(serve(
            &store,
            Request::SetProp {
                object: id,
                name: "hp".into(),
                value: Value::Number(3.0),
            },
        ))
        .unwrap();
        assert!(matches!(reply, Reply::Done));

        let reply = block_on(serve(
            &store,
            Request::GetProp {
                object: id,
                name: "hp".into(),
            },
        ))
        .unwrap();
        assert!(matches!(reply, Reply::Value(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn serve_alias() {
        let (store, id) = store();
        store.set_alias("Root", id);
        let reply = block_on(serve(
            &store,
            Request::ResolveAlias {
                name: "Root".into(),
            },
        ))
        .unwrap();
        assert!(matches!(reply, Reply::Value(Value::Object(found)) if found == id));

        let err = block_on(serve(
            &store,
            Request::ResolveAlias {
                name: "Nope".into(),
            },
        ))
        .unwrap_err();
        assert_eq!(err, RuntimeError::UnknownAlias("Nope".into()));
    }

    #[test]
    fn call_compiles_verb_into_frame() {
        let (store, id) = store();
        store.set_verb(id, "greet", "$_return = 'hi ' + $_directObj").unwrap();
        let args = CallArgs::new("greet", id).with_direct_obj(Value::Str("bob".into()));

        let reply = block_on(serve(&store, Request::Call { object: id, args })).unwrap();
        let Reply::Frame(vm) = reply else {
            panic!("expected a frame");
        };
        assert_eq!(vm.owner(), id);
        assert_eq!(vm.local("_verb"), Some(&Value::Str("greet".into())));
        assert_eq!(vm.local("_directObj"), Some(&Value::Str("bob".into())));
    }

    #[test]
    fn call_reports_compile_errors() {
        let (store, id) = store();
        store.set_verb(id, "broken", "if 1").unwrap();
        let args = CallArgs::new("broken", id);
        let err = block_on(store.resolve_and_call(id, &args)).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Compile(SyntaxError::new(1, "1 block(s) are still open."))
        );
    }

    #[test]
    fn call_unknown_verb() {
        let (store, id) = store();
        let err = block_on(store.find_verb(id, "dance")).unwrap_err();
        assert_eq!(err, RuntimeError::VerbNotFound("dance".into()));
    }
}
