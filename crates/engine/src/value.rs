use runtime::Entity;
use serde_json::Value;

/// Output of a field resolution. Cached payloads are the serialized form of this type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolvedValue {
    Null,
    Entity(Entity),
    Entities(Vec<Entity>),
    Page(Page),
    /// Attributes and custom resolver results.
    Json(Value),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Page {
    Paginator {
        data: Vec<Entity>,
        paginator_info: PaginatorInfo,
    },
    Simple {
        data: Vec<Entity>,
        paginator_info: SimplePaginatorInfo,
    },
    Connection {
        edges: Vec<Edge>,
        page_info: ConnectionPageInfo,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatorInfo {
    pub count: usize,
    pub current_page: usize,
    pub first_item: Option<usize>,
    pub last_item: Option<usize>,
    pub has_more_pages: bool,
    pub last_page: usize,
    pub per_page: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplePaginatorInfo {
    pub count: usize,
    pub current_page: usize,
    pub first_item: Option<usize>,
    pub last_item: Option<usize>,
    pub has_more_pages: bool,
    pub per_page: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub cursor: String,
    pub node: Entity,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub total: usize,
    pub count: usize,
    pub current_page: usize,
    pub last_page: usize,
}

impl ResolvedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResolvedValue::Null)
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            ResolvedValue::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Entities of the value, whatever its shape.
    pub fn entities(&self) -> Vec<&Entity> {
        match self {
            ResolvedValue::Entity(entity) => vec![entity],
            ResolvedValue::Entities(entities) => entities.iter().collect(),
            ResolvedValue::Page(page) => page.entities(),
            ResolvedValue::Null | ResolvedValue::Json(_) => Vec::new(),
        }
    }

    pub(crate) fn entities_mut(&mut self) -> Vec<&mut Entity> {
        match self {
            ResolvedValue::Entity(entity) => vec![entity],
            ResolvedValue::Entities(entities) => entities.iter_mut().collect(),
            ResolvedValue::Page(page) => page.entities_mut(),
            ResolvedValue::Null | ResolvedValue::Json(_) => Vec::new(),
        }
    }
}

impl Page {
    pub fn entities(&self) -> Vec<&Entity> {
        match self {
            Page::Paginator { data, .. } | Page::Simple { data, .. } => data.iter().collect(),
            Page::Connection { edges, .. } => edges.iter().map(|edge| &edge.node).collect(),
        }
    }

    fn entities_mut(&mut self) -> Vec<&mut Entity> {
        match self {
            Page::Paginator { data, .. } | Page::Simple { data, .. } => data.iter_mut().collect(),
            Page::Connection { edges, .. } => edges.iter_mut().map(|edge| &mut edge.node).collect(),
        }
    }
}
