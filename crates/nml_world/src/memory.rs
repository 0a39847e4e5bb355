//! In-memory world storage.
//!
//! Objects live in a persistent [`OrdMap`] behind a [`RwLock`], so a
//! snapshot is a cheap clone and readers never block each other. New object
//! ids come from a seeded `ChaCha` generator, which keeps a world built from
//! the same seed reproducible.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use im::OrdMap;
use nml_foundation::{Error, ObjectId, RuntimeError, Value};
use nml_language::{CallArgs, Vm, code_to_ast};
use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::serialize::Snapshot;
use crate::store::ObjectStore;

/// Reads as null and ignores writes.
pub const VERBS_PROP: &str = "_verbs";

/// Reads as the creation time in unix seconds and ignores writes.
pub const CREATED_PROP: &str = "_created";

const MAX_GENERATED_ID: u64 = 0xFFFF_FFFF;

/// A world object: properties and verbs, plus an optional parent to
/// inherit both from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MObject {
    /// The object's id.
    pub id: ObjectId,
    /// Object that missing properties and verbs are looked up on.
    pub parent: Option<ObjectId>,
    /// Creation time in unix seconds.
    pub created: u64,
    /// Properties set directly on this object.
    pub props: OrdMap<String, Value>,
    /// Verb sources defined directly on this object.
    pub verbs: OrdMap<String, String>,
}

impl MObject {
    /// Creates an empty object.
    #[must_use]
    pub fn new(id: ObjectId, parent: Option<ObjectId>, created: u64) -> Self {
        Self {
            id,
            parent,
            created,
            props: OrdMap::new(),
            verbs: OrdMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct World {
    objects: OrdMap<ObjectId, MObject>,
    aliases: OrdMap<String, ObjectId>,
}

impl World {
    fn object(&self, id: ObjectId) -> Result<&MObject, RuntimeError> {
        self.objects.get(&id).ok_or(RuntimeError::ObjectNotFound(id))
    }

    /// Walks from `start` up the parent chain and returns the first hit.
    /// A missing ancestor or a loop ends the walk.
    fn inherited<T>(
        &self,
        start: ObjectId,
        probe: impl Fn(&MObject) -> Option<T>,
    ) -> Result<Option<T>, RuntimeError> {
        let mut seen = HashSet::new();
        let mut next = Some(self.object(start)?);
        while let Some(object) = next {
            if !seen.insert(object.id) {
                break;
            }
            if let Some(found) = probe(object) {
                return Ok(Some(found));
            }
            next = object.parent.and_then(|parent| self.objects.get(&parent));
        }
        Ok(None)
    }
}

/// A world held entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    world: RwLock<World>,
    rng: Mutex<ChaCha8Rng>,
    seed: u64,
}

impl MemoryStore {
    /// Creates an empty world with seed 0.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Creates an empty world whose generated ids follow `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            world: RwLock::new(World::default()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            seed,
        }
    }

    /// The id generator's seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Creates an object with a fresh id and returns the id.
    pub fn create(&self, parent: Option<ObjectId>) -> ObjectId {
        let mut world = self.world.write();
        let mut rng = self.rng.lock();
        let id = loop {
            let candidate = ObjectId(rng.gen_range(1..=MAX_GENERATED_ID));
            if !world.objects.contains_key(&candidate) {
                break candidate;
            }
        };
        world
            .objects
            .insert(id, MObject::new(id, parent, unix_now()));
        debug!(%id, "created object");
        id
    }

    /// Inserts an object under its own id, returning the one it replaced.
    pub fn insert(&self, object: MObject) -> Option<MObject> {
        self.world.write().objects.insert(object.id, object)
    }

    /// Returns a copy of an object.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<MObject> {
        self.world.read().objects.get(&id).cloned()
    }

    /// Returns true if the object exists.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.world.read().objects.contains_key(&id)
    }

    /// Number of objects in the world.
    #[must_use]
    pub fn len(&self) -> usize {
        self.world.read().objects.len()
    }

    /// Returns true if the world has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.world.read().objects.is_empty()
    }

    /// All object ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.world.read().objects.keys().copied().collect()
    }

    /// Changes an object's parent.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] if the object does not exist.
    pub fn set_parent(&self, id: ObjectId, parent: Option<ObjectId>) -> Result<(), RuntimeError> {
        let mut world = self.world.write();
        let object = world
            .objects
            .get_mut(&id)
            .ok_or(RuntimeError::ObjectNotFound(id))?;
        object.parent = parent;
        Ok(())
    }

    /// Registers `##name` for an object, replacing any previous target.
    pub fn set_alias(&self, name: impl Into<String>, id: ObjectId) {
        self.world.write().aliases.insert(name.into(), id);
    }

    /// Looks up an alias.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<ObjectId> {
        self.world.read().aliases.get(name).copied()
    }

    /// All aliases in name order.
    #[must_use]
    pub fn aliases(&self) -> Vec<(String, ObjectId)> {
        self.world
            .read()
            .aliases
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect()
    }

    /// Reads a property as a script would.
    ///
    /// `_verbs` reads as null and `_created` as the object's creation time.
    /// Anything else is looked up on the object and then its ancestors.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] or [`RuntimeError::PropNotFound`].
    pub fn read_prop(&self, id: ObjectId, name: &str) -> Result<Value, RuntimeError> {
        let world = self.world.read();
        let object = world.object(id)?;
        match name {
            VERBS_PROP => Ok(Value::Null),
            #[allow(clippy::cast_precision_loss)]
            CREATED_PROP => Ok(Value::Number(object.created as f64)),
            _ => world
                .inherited(id, |o| o.props.get(name).cloned())?
                .ok_or_else(|| RuntimeError::PropNotFound(name.to_string())),
        }
    }

    /// Writes a property on the object itself. Writes to `_verbs` and
    /// `_created` are ignored.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] if the object does not exist.
    pub fn write_prop(&self, id: ObjectId, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut world = self.world.write();
        let object = world
            .objects
            .get_mut(&id)
            .ok_or(RuntimeError::ObjectNotFound(id))?;
        if name == VERBS_PROP || name == CREATED_PROP {
            debug!(%id, name, "ignored write to read-only property");
            return Ok(());
        }
        object.props.insert(name.to_string(), value);
        Ok(())
    }

    /// Properties set directly on an object, in name order.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] if the object does not exist.
    pub fn props(&self, id: ObjectId) -> Result<Vec<(String, Value)>, RuntimeError> {
        let world = self.world.read();
        Ok(world
            .object(id)?
            .props
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }

    /// Defines or replaces a verb on an object. The source is stored as is
    /// and compiled when the verb is called.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] if the object does not exist.
    pub fn set_verb(
        &self,
        id: ObjectId,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), RuntimeError> {
        let mut world = self.world.write();
        let object = world
            .objects
            .get_mut(&id)
            .ok_or(RuntimeError::ObjectNotFound(id))?;
        object.verbs.insert(name.into(), source.into());
        Ok(())
    }

    /// Source of a verb defined directly on an object.
    #[must_use]
    pub fn verb_source(&self, id: ObjectId, name: &str) -> Option<String> {
        self.world
            .read()
            .objects
            .get(&id)
            .and_then(|o| o.verbs.get(name).cloned())
    }

    /// Names of the verbs defined directly on an object, sorted.
    #[must_use]
    pub fn verb_names(&self, id: ObjectId) -> Vec<String> {
        self.world
            .read()
            .objects
            .get(&id)
            .map(|o| o.verbs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Finds a verb on the object or its ancestors.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ObjectNotFound`] or [`RuntimeError::VerbNotFound`].
    pub fn lookup_verb(&self, id: ObjectId, name: &str) -> Result<String, RuntimeError> {
        self.world
            .read()
            .inherited(id, |o| o.verbs.get(name).cloned())?
            .ok_or_else(|| RuntimeError::VerbNotFound(name.to_string()))
    }

    /// Compiles a verb into a VM ready to run as `args` describes.
    ///
    /// # Errors
    ///
    /// [`Error::Runtime`] when the verb cannot be found and [`Error::Syntax`]
    /// when its source does not compile.
    pub fn vm_from_verb(&self, id: ObjectId, args: &CallArgs) -> Result<Vm, Error> {
        let source = self.lookup_verb(id, &args.verb)?;
        let ast = code_to_ast(&source)?;
        Ok(Vm::for_call(id, ast, args))
    }

    /// Captures the world and the id generator's position.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let word_pos = self.rng.lock().get_word_pos();
        Snapshot {
            seed: self.seed,
            word_pos: u64::try_from(word_pos).unwrap_or(u64::MAX),
            world: self.world.read().clone(),
        }
    }

    /// Rebuilds a store from a snapshot. Ids generated afterwards continue
    /// the sequence the snapshotted store would have produced.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(snapshot.seed);
        rng.set_word_pos(u128::from(snapshot.word_pos));
        Self {
            world: RwLock::new(snapshot.world),
            rng: Mutex::new(rng),
            seed: snapshot.seed,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_prop(&self, object: ObjectId, name: &str) -> Result<Value, RuntimeError> {
        self.read_prop(object, name)
    }

    async fn set_prop(
        &self,
        object: ObjectId,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.write_prop(object, name, value)
    }

    async fn resolve_alias(&self, name: &str) -> Result<ObjectId, RuntimeError> {
        self.alias(name)
            .ok_or_else(|| RuntimeError::UnknownAlias(name.to_string()))
    }

    async fn find_verb(&self, object: ObjectId, verb: &str) -> Result<String, RuntimeError> {
        self.lookup_verb(object, verb)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
