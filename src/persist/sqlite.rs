//! SQLite implementation of the [`Reader`]/[`Writer`] contract.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::{debug, trace};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Value};
use serde::{Deserialize, Serialize};

use crate::{
    entity::{
        ClassifierField, ClassifierRecord, DiagramElementField, DiagramElementRecord,
        DiagramField, DiagramRecord, EntitySnapshot, FeatureField, FeatureRecord, FieldChange,
        RelationshipField, RelationshipRecord,
    },
    types::{
        ClassifierType, DiagramType, EntityKind, FeatureType, ROW_ID_VOID, RelationshipType,
        RowId,
    },
};

use super::{Reader, StoreError, StoreResult, Writer};

const DIAGRAM_COLUMNS: &str =
    "id, parent_id, diagram_type, stereotype, name, description, list_order, display_flags, uuid";
const DIAGRAMELEMENT_COLUMNS: &str =
    "id, diagram_id, classifier_id, display_flags, focused_feature_id, uuid";
const CLASSIFIER_COLUMNS: &str =
    "id, main_type, stereotype, name, description, x_order, y_order, list_order, uuid";
const FEATURE_COLUMNS: &str =
    "id, main_type, classifier_id, key, value, description, list_order, uuid";
const RELATIONSHIP_COLUMNS: &str = "id, main_type, from_classifier_id, to_classifier_id, \
     from_feature_id, to_feature_id, stereotype, name, description, list_order, uuid";

/// Connection tuning applied at open time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Use write-ahead logging.
    pub wal: bool,
    /// Use `synchronous=NORMAL` instead of `FULL`.
    pub synchronous_normal: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            wal: true,
            synchronous_normal: true,
        }
    }
}

/// SQLite-backed model store.
///
/// The connection and its statement cache sit behind a mutex so that
/// read-only users on other threads cannot corrupt prepared-query state.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a store at `path` with default tuning.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, &SqliteConfig::default())
    }

    /// Opens or creates a store at `path`.
    pub fn open_with(path: impl AsRef<Path>, config: &SqliteConfig) -> StoreResult<Self> {
        debug!("opening sqlite store at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        Self::init_connection(conn, config)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(
            conn,
            &SqliteConfig {
                wal: false,
                ..SqliteConfig::default()
            },
        )
    }

    fn init_connection(conn: Connection, config: &SqliteConfig) -> StoreResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        if config.wal {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        if config.synchronous_normal {
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of rows in the `kind` table.
    pub fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        let conn = self.lock()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table_name(kind));
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Every row of every table, grouped by kind and ordered by id.
    pub fn export_rows(&self) -> StoreResult<Vec<EntitySnapshot>> {
        let conn = self.lock()?;
        let mut out = Vec::new();
        out.extend(
            query_all(&conn, &select_all(DIAGRAM_COLUMNS, "diagrams"), diagram_from_row)?
                .into_iter()
                .map(EntitySnapshot::from),
        );
        out.extend(
            query_all(
                &conn,
                &select_all(DIAGRAMELEMENT_COLUMNS, "diagramelements"),
                diagramelement_from_row,
            )?
            .into_iter()
            .map(EntitySnapshot::from),
        );
        out.extend(
            query_all(&conn, &select_all(CLASSIFIER_COLUMNS, "classifiers"), classifier_from_row)?
                .into_iter()
                .map(EntitySnapshot::from),
        );
        out.extend(
            query_all(&conn, &select_all(FEATURE_COLUMNS, "features"), feature_from_row)?
                .into_iter()
                .map(EntitySnapshot::from),
        );
        out.extend(
            query_all(
                &conn,
                &select_all(RELATIONSHIP_COLUMNS, "relationships"),
                relationship_from_row,
            )?
            .into_iter()
            .map(EntitySnapshot::from),
        );
        Ok(out)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Reader for SqliteStore {
    fn read(&self, kind: EntityKind, id: RowId) -> StoreResult<EntitySnapshot> {
        let conn = self.lock()?;
        let found = match kind {
            EntityKind::Diagram => query_by_id(&conn, DIAGRAM_COLUMNS, "diagrams", id, diagram_from_row)?
                .map(EntitySnapshot::from),
            EntityKind::DiagramElement => query_by_id(
                &conn,
                DIAGRAMELEMENT_COLUMNS,
                "diagramelements",
                id,
                diagramelement_from_row,
            )?
            .map(EntitySnapshot::from),
            EntityKind::Classifier => {
                query_by_id(&conn, CLASSIFIER_COLUMNS, "classifiers", id, classifier_from_row)?
                    .map(EntitySnapshot::from)
            }
            EntityKind::Feature => query_by_id(&conn, FEATURE_COLUMNS, "features", id, feature_from_row)?
                .map(EntitySnapshot::from),
            EntityKind::Relationship => query_by_id(
                &conn,
                RELATIONSHIP_COLUMNS,
                "relationships",
                id,
                relationship_from_row,
            )?
            .map(EntitySnapshot::from),
        };
        found.ok_or(StoreError::NotFound { kind, id })
    }

    fn find_root_diagram(&self) -> StoreResult<Option<DiagramRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {DIAGRAM_COLUMNS} FROM diagrams WHERE parent_id IS NULL ORDER BY id ASC LIMIT 1"
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let found = stmt.query_row([], |row| Ok(diagram_from_row(row))).optional()?;
        found.transpose()
    }
}

impl Writer for SqliteStore {
    fn create(&self, snapshot: &EntitySnapshot) -> StoreResult<RowId> {
        let conn = self.lock()?;
        let explicit = void_to_null(snapshot.id());
        match snapshot {
            EntitySnapshot::Diagram(r) => {
                let mut stmt = conn.prepare_cached(
                    "INSERT INTO diagrams(id, parent_id, diagram_type, stereotype, name, description, \
                     list_order, display_flags, uuid) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )?;
                stmt.execute(params![
                    explicit,
                    void_to_null(r.parent_id),
                    r.diagram_type.code(),
                    r.stereotype,
                    r.name,
                    r.description,
                    r.list_order,
                    r.display_flags,
                    r.uuid,
                ])?;
            }
            EntitySnapshot::DiagramElement(r) => {
                let mut stmt = conn.prepare_cached(
                    "INSERT INTO diagramelements(id, diagram_id, classifier_id, display_flags, \
                     focused_feature_id, uuid) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                stmt.execute(params![
                    explicit,
                    r.diagram_id,
                    r.classifier_id,
                    r.display_flags,
                    void_to_null(r.focused_feature_id),
                    r.uuid,
                ])?;
            }
            EntitySnapshot::Classifier(r) => {
                let mut stmt = conn.prepare_cached(
                    "INSERT INTO classifiers(id, main_type, stereotype, name, description, x_order, \
                     y_order, list_order, uuid) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )?;
                stmt.execute(params![
                    explicit,
                    r.main_type.code(),
                    r.stereotype,
                    r.name,
                    r.description,
                    r.x_order,
                    r.y_order,
                    r.list_order,
                    r.uuid,
                ])?;
            }
            EntitySnapshot::Feature(r) => {
                let mut stmt = conn.prepare_cached(
                    "INSERT INTO features(id, main_type, classifier_id, key, value, description, \
                     list_order, uuid) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                stmt.execute(params![
                    explicit,
                    r.main_type.code(),
                    r.classifier_id,
                    r.key,
                    r.value,
                    r.description,
                    r.list_order,
                    r.uuid,
                ])?;
            }
            EntitySnapshot::Relationship(r) => {
                let mut stmt = conn.prepare_cached(
                    "INSERT INTO relationships(id, main_type, from_classifier_id, to_classifier_id, \
                     from_feature_id, to_feature_id, stereotype, name, description, list_order, uuid) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )?;
                stmt.execute(params![
                    explicit,
                    r.main_type.code(),
                    r.from_classifier_id,
                    r.to_classifier_id,
                    void_to_null(r.from_feature_id),
                    void_to_null(r.to_feature_id),
                    r.stereotype,
                    r.name,
                    r.description,
                    r.list_order,
                    r.uuid,
                ])?;
            }
        }
        let id = explicit.unwrap_or_else(|| conn.last_insert_rowid());
        trace!("sqlite: inserted {} {id}", snapshot.kind());
        Ok(id)
    }

    fn update_field(&self, id: RowId, change: &FieldChange) -> StoreResult<()> {
        let (column, value) = field_column(change);
        let kind = change.kind();
        let sql = format!("UPDATE {} SET {column} = ?1 WHERE id = ?2", table_name(kind));
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let changed = stmt.execute(params![value, id])?;
        if changed == 0 {
            return Err(StoreError::NotFound { kind, id });
        }
        trace!("sqlite: updated {kind} {id}.{column}");
        Ok(())
    }

    fn update_record(&self, snapshot: &EntitySnapshot) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = match snapshot {
            EntitySnapshot::Diagram(r) => conn
                .prepare_cached(
                    "UPDATE diagrams SET parent_id = ?2, diagram_type = ?3, stereotype = ?4, \
                     name = ?5, description = ?6, list_order = ?7, display_flags = ?8, uuid = ?9 \
                     WHERE id = ?1",
                )?
                .execute(params![
                    r.id,
                    void_to_null(r.parent_id),
                    r.diagram_type.code(),
                    r.stereotype,
                    r.name,
                    r.description,
                    r.list_order,
                    r.display_flags,
                    r.uuid,
                ])?,
            EntitySnapshot::DiagramElement(r) => conn
                .prepare_cached(
                    "UPDATE diagramelements SET diagram_id = ?2, classifier_id = ?3, \
                     display_flags = ?4, focused_feature_id = ?5, uuid = ?6 WHERE id = ?1",
                )?
                .execute(params![
                    r.id,
                    r.diagram_id,
                    r.classifier_id,
                    r.display_flags,
                    void_to_null(r.focused_feature_id),
                    r.uuid,
                ])?,
            EntitySnapshot::Classifier(r) => conn
                .prepare_cached(
                    "UPDATE classifiers SET main_type = ?2, stereotype = ?3, name = ?4, \
                     description = ?5, x_order = ?6, y_order = ?7, list_order = ?8, uuid = ?9 \
                     WHERE id = ?1",
                )?
                .execute(params![
                    r.id,
                    r.main_type.code(),
                    r.stereotype,
                    r.name,
                    r.description,
                    r.x_order,
                    r.y_order,
                    r.list_order,
                    r.uuid,
                ])?,
            EntitySnapshot::Feature(r) => conn
                .prepare_cached(
                    "UPDATE features SET main_type = ?2, classifier_id = ?3, key = ?4, value = ?5, \
                     description = ?6, list_order = ?7, uuid = ?8 WHERE id = ?1",
                )?
                .execute(params![
                    r.id,
                    r.main_type.code(),
                    r.classifier_id,
                    r.key,
                    r.value,
                    r.description,
                    r.list_order,
                    r.uuid,
                ])?,
            EntitySnapshot::Relationship(r) => conn
                .prepare_cached(
                    "UPDATE relationships SET main_type = ?2, from_classifier_id = ?3, \
                     to_classifier_id = ?4, from_feature_id = ?5, to_feature_id = ?6, \
                     stereotype = ?7, name = ?8, description = ?9, list_order = ?10, uuid = ?11 \
                     WHERE id = ?1",
                )?
                .execute(params![
                    r.id,
                    r.main_type.code(),
                    r.from_classifier_id,
                    r.to_classifier_id,
                    void_to_null(r.from_feature_id),
                    void_to_null(r.to_feature_id),
                    r.stereotype,
                    r.name,
                    r.description,
                    r.list_order,
                    r.uuid,
                ])?,
        };
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: snapshot.kind(),
                id: snapshot.id(),
            });
        }
        trace!("sqlite: rewrote {} {}", snapshot.kind(), snapshot.id());
        Ok(())
    }

    fn delete(&self, kind: EntityKind, id: RowId) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table_name(kind));
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        if stmt.execute(params![id])? == 0 {
            return Err(StoreError::NotFound { kind, id });
        }
        trace!("sqlite: deleted {kind} {id}");
        Ok(())
    }
}

fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Diagram => "diagrams",
        EntityKind::DiagramElement => "diagramelements",
        EntityKind::Classifier => "classifiers",
        EntityKind::Feature => "features",
        EntityKind::Relationship => "relationships",
    }
}

fn select_all(columns: &str, table: &str) -> String {
    format!("SELECT {columns} FROM {table} ORDER BY id ASC")
}

fn query_by_id<T>(
    conn: &Connection,
    columns: &str,
    table: &str,
    id: RowId,
    from_row: fn(&Row<'_>) -> StoreResult<T>,
) -> StoreResult<Option<T>> {
    let sql = format!("SELECT {columns} FROM {table} WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    let found = stmt.query_row(params![id], |row| Ok(from_row(row))).optional()?;
    found.transpose()
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    from_row: fn(&Row<'_>) -> StoreResult<T>,
) -> StoreResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok(from_row(row)))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row??);
    }
    Ok(out)
}

/// NULL for [`ROW_ID_VOID`], so SQLite assigns the id or stores "no reference".
fn void_to_null(id: RowId) -> Option<i64> {
    (id != ROW_ID_VOID).then_some(id)
}

fn ref_or_void(v: Option<i64>) -> RowId {
    v.unwrap_or(ROW_ID_VOID)
}

fn decode<T>(code: i64, from_code: fn(i64) -> Option<T>, what: &str) -> StoreResult<T> {
    from_code(code).ok_or_else(|| StoreError::DbStructure(format!("unknown {what} code {code}")))
}

fn diagram_from_row(row: &Row<'_>) -> StoreResult<DiagramRecord> {
    Ok(DiagramRecord {
        id: row.get(0)?,
        parent_id: ref_or_void(row.get(1)?),
        diagram_type: decode(row.get(2)?, DiagramType::from_code, "diagram type")?,
        stereotype: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        list_order: row.get(6)?,
        display_flags: row.get(7)?,
        uuid: row.get(8)?,
    })
}

fn diagramelement_from_row(row: &Row<'_>) -> StoreResult<DiagramElementRecord> {
    Ok(DiagramElementRecord {
        id: row.get(0)?,
        diagram_id: row.get(1)?,
        classifier_id: row.get(2)?,
        display_flags: row.get(3)?,
        focused_feature_id: ref_or_void(row.get(4)?),
        uuid: row.get(5)?,
    })
}

fn classifier_from_row(row: &Row<'_>) -> StoreResult<ClassifierRecord> {
    Ok(ClassifierRecord {
        id: row.get(0)?,
        main_type: decode(row.get(1)?, ClassifierType::from_code, "classifier type")?,
        stereotype: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        x_order: row.get(5)?,
        y_order: row.get(6)?,
        list_order: row.get(7)?,
        uuid: row.get(8)?,
    })
}

fn feature_from_row(row: &Row<'_>) -> StoreResult<FeatureRecord> {
    Ok(FeatureRecord {
        id: row.get(0)?,
        main_type: decode(row.get(1)?, FeatureType::from_code, "feature type")?,
        classifier_id: row.get(2)?,
        key: row.get(3)?,
        value: row.get(4)?,
        description: row.get(5)?,
        list_order: row.get(6)?,
        uuid: row.get(7)?,
    })
}

fn relationship_from_row(row: &Row<'_>) -> StoreResult<RelationshipRecord> {
    Ok(RelationshipRecord {
        id: row.get(0)?,
        main_type: decode(row.get(1)?, RelationshipType::from_code, "relationship type")?,
        from_classifier_id: row.get(2)?,
        to_classifier_id: row.get(3)?,
        from_feature_id: ref_or_void(row.get(4)?),
        to_feature_id: ref_or_void(row.get(5)?),
        stereotype: row.get(6)?,
        name: row.get(7)?,
        description: row.get(8)?,
        list_order: row.get(9)?,
        uuid: row.get(10)?,
    })
}

fn ref_value(id: RowId) -> Value {
    match void_to_null(id) {
        Some(v) => Value::Integer(v),
        None => Value::Null,
    }
}

fn field_column(change: &FieldChange) -> (&'static str, Value) {
    match change {
        FieldChange::Diagram(f) => match f {
            DiagramField::ParentId(v) => ("parent_id", ref_value(*v)),
            DiagramField::DiagramType(v) => ("diagram_type", Value::Integer(v.code())),
            DiagramField::Stereotype(v) => ("stereotype", Value::Text(v.clone())),
            DiagramField::Name(v) => ("name", Value::Text(v.clone())),
            DiagramField::Description(v) => ("description", Value::Text(v.clone())),
            DiagramField::ListOrder(v) => ("list_order", Value::Integer(i64::from(*v))),
            DiagramField::DisplayFlags(v) => ("display_flags", Value::Integer(*v)),
        },
        FieldChange::DiagramElement(f) => match f {
            DiagramElementField::DisplayFlags(v) => ("display_flags", Value::Integer(*v)),
            DiagramElementField::FocusedFeatureId(v) => ("focused_feature_id", ref_value(*v)),
        },
        FieldChange::Classifier(f) => match f {
            ClassifierField::MainType(v) => ("main_type", Value::Integer(v.code())),
            ClassifierField::Stereotype(v) => ("stereotype", Value::Text(v.clone())),
            ClassifierField::Name(v) => ("name", Value::Text(v.clone())),
            ClassifierField::Description(v) => ("description", Value::Text(v.clone())),
            ClassifierField::XOrder(v) => ("x_order", Value::Integer(i64::from(*v))),
            ClassifierField::YOrder(v) => ("y_order", Value::Integer(i64::from(*v))),
            ClassifierField::ListOrder(v) => ("list_order", Value::Integer(i64::from(*v))),
        },
        FieldChange::Feature(f) => match f {
            FeatureField::MainType(v) => ("main_type", Value::Integer(v.code())),
            FeatureField::Key(v) => ("key", Value::Text(v.clone())),
            FeatureField::Value(v) => ("value", Value::Text(v.clone())),
            FeatureField::Description(v) => ("description", Value::Text(v.clone())),
            FeatureField::ListOrder(v) => ("list_order", Value::Integer(i64::from(*v))),
        },
        FieldChange::Relationship(f) => match f {
            RelationshipField::MainType(v) => ("main_type", Value::Integer(v.code())),
            RelationshipField::Stereotype(v) => ("stereotype", Value::Text(v.clone())),
            RelationshipField::Name(v) => ("name", Value::Text(v.clone())),
            RelationshipField::Description(v) => ("description", Value::Text(v.clone())),
            RelationshipField::ListOrder(v) => ("list_order", Value::Integer(i64::from(*v))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_ids_are_kept_and_void_refs_become_null() {
        let store = SqliteStore::open_in_memory().expect("open");
        let mut rec = RelationshipRecord::new(RelationshipType::Association, 1, 2);
        rec.id = 40;
        rec.to_feature_id = 7;

        let id = store.create(&rec.clone().into()).expect("create");
        assert_eq!(id, 40);

        let back = store.read(EntityKind::Relationship, 40).expect("read");
        assert_eq!(back, EntitySnapshot::Relationship(rec));
        assert_eq!(
            back.as_relationship().map(|r| r.from_feature_id),
            Some(ROW_ID_VOID)
        );
    }

    #[test]
    fn unknown_type_code_is_a_structure_error() {
        let store = SqliteStore::open_in_memory().expect("open");
        {
            let conn = store.lock().expect("lock");
            conn.execute(
                "INSERT INTO classifiers(id, main_type, name) VALUES (5, 9999, 'Broken')",
                [],
            )
            .expect("raw insert");
        }
        let err = store.read(EntityKind::Classifier, 5).expect_err("bad code");
        assert!(matches!(err, StoreError::DbStructure(_)), "{err:?}");
    }

    #[test]
    fn missing_rows_report_not_found() {
        let store = SqliteStore::open_in_memory().expect("open");
        assert!(matches!(
            store.read(EntityKind::Diagram, 1),
            Err(StoreError::NotFound { kind: EntityKind::Diagram, id: 1 })
        ));
        assert!(matches!(
            store.delete(EntityKind::Feature, 3),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.update_field(9, &FieldChange::Feature(FeatureField::Key("k".into()))),
            Err(StoreError::NotFound { .. })
        ));
        assert!(store.find_root_diagram().expect("root").is_none());
    }
}
