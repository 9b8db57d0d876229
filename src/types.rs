//! Shared primitive ids, entity kinds, and model type enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned row identifier.
pub type RowId = i64;

/// Sentinel row id meaning "not yet persisted" or "no reference".
pub const ROW_ID_VOID: RowId = -1;

/// The five persisted entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// A diagram.
    Diagram,
    /// A classifier placed on a diagram.
    DiagramElement,
    /// A classifier (class, component, actor, ...).
    Classifier,
    /// A feature owned by a classifier.
    Feature,
    /// A relationship between two classifiers.
    Relationship,
}

impl EntityKind {
    /// All kinds in declaration order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Diagram,
        EntityKind::DiagramElement,
        EntityKind::Classifier,
        EntityKind::Feature,
        EntityKind::Relationship,
    ];

    /// Dense index, usable for per-kind arrays.
    pub const fn index(self) -> usize {
        match self {
            EntityKind::Diagram => 0,
            EntityKind::DiagramElement => 1,
            EntityKind::Classifier => 2,
            EntityKind::Feature => 3,
            EntityKind::Relationship => 4,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Diagram => "diagram",
            EntityKind::DiagramElement => "diagramelement",
            EntityKind::Classifier => "classifier",
            EntityKind::Feature => "feature",
            EntityKind::Relationship => "relationship",
        };
        f.write_str(name)
    }
}

/// Reference to one persisted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity kind, selecting the table.
    pub kind: EntityKind,
    /// Row id within that table.
    pub id: RowId,
}

impl EntityRef {
    /// Builds a reference.
    pub const fn new(kind: EntityKind, id: RowId) -> Self {
        Self { kind, id }
    }
}

/// Whether an appended journal entry opens a new undo group or joins the open one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Insert a boundary first; the entry starts a new undo step.
    StartNew,
    /// Join the current undo step.
    Append,
}

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $code:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Stable integer code stored in the database.
            pub const fn code(self) -> i64 {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            /// Decodes a stored integer code.
            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

coded_enum! {
    /// Diagram flavor.
    DiagramType {
        /// Free list of elements without layout semantics.
        List = 0x0101,
        /// Box diagram.
        Box = 0x0102,
        /// Block definition (SysML).
        BlockDefinition = 0x0201,
        /// Internal block (SysML).
        InternalBlock = 0x0202,
        /// Requirements.
        Requirement = 0x0203,
        /// Use cases.
        UseCase = 0x0301,
        /// Activities.
        Activity = 0x0302,
        /// State machine.
        StateMachine = 0x0303,
        /// Sequence.
        Sequence = 0x0304,
        /// Class diagram.
        Class = 0x0401,
        /// Component diagram.
        Component = 0x0402,
        /// Deployment diagram.
        Deployment = 0x0403,
        /// Package diagram.
        Package = 0x0404,
    }
}

coded_enum! {
    /// Classifier flavor.
    ClassifierType {
        /// Block (SysML).
        Block = 200,
        /// Requirement.
        Requirement = 210,
        /// Actor.
        Actor = 300,
        /// Use case.
        UseCase = 301,
        /// System boundary.
        Boundary = 302,
        /// Activity.
        Activity = 310,
        /// State.
        State = 311,
        /// Node.
        Node = 400,
        /// Component.
        Component = 401,
        /// Part.
        Part = 402,
        /// Interface.
        Interface = 403,
        /// Package.
        Package = 404,
        /// Class.
        Class = 405,
        /// Object.
        Object = 406,
        /// Artifact.
        Artifact = 407,
        /// Comment.
        Comment = 1200,
    }
}

coded_enum! {
    /// Feature flavor.
    FeatureType {
        /// Attribute / property.
        Property = 0,
        /// Operation / method.
        Operation = 1,
        /// Port.
        Port = 2,
        /// Lifeline on a sequence diagram.
        Lifeline = 3,
        /// Provided interface.
        ProvidedInterface = 4,
        /// Required interface.
        RequiredInterface = 5,
        /// Tagged value.
        TaggedValue = 6,
    }
}

coded_enum! {
    /// Relationship flavor.
    RelationshipType {
        /// Plain dependency.
        Dependency = 0,
        /// Association.
        Association = 200,
        /// Aggregation.
        Aggregation = 201,
        /// Composition.
        Composition = 202,
        /// Generalization.
        Generalization = 210,
        /// Realization.
        Realization = 211,
        /// Asynchronous call.
        AsyncCall = 220,
        /// Synchronous call.
        SyncCall = 221,
        /// Return of a call.
        ReturnCall = 222,
        /// Communication path.
        CommunicationPath = 223,
        /// Control flow.
        ControlFlow = 230,
        /// Object flow.
        ObjectFlow = 231,
        /// Deployment.
        Deploy = 240,
        /// Manifestation.
        Manifest = 241,
        /// Use-case extension.
        Extend = 250,
        /// Use-case inclusion.
        Include = 251,
        /// Containment.
        Containment = 300,
        /// Refinement.
        Refine = 310,
        /// Trace link.
        Trace = 311,
    }
}
