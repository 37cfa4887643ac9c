pub mod core;
pub mod analysis;
pub mod schema;
pub mod query;
pub mod index;
pub mod reader;
pub mod security;
pub mod search;

pub use crate::core::config::{EngineConfig, GrowthBudgets};
pub use crate::core::context::{ExecutionMode, QueryContext, QuerySettings, SimpleQueryContext, SortField};
pub use crate::core::engine::QueryEngine;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocumentHandle, IndexValue, NodeId};
pub use crate::search::results::QueryResult;

/*
┌──────────────────────────────────────────────────────────────────────────────────────┐
│                              CQL ENGINE ARCHITECTURE                                 │
└──────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── QUERY LAYER ─────────────────────────────────────┐
│                                                                                      │
│  text ──> lexer::tokenize ──> CqlParser ──> Predicate ──> QueryCompiler              │
│                                  │                            │                      │
│                     field metadata (QueryContext)     QueryValidator (depth/clauses) │
│                                                               │                      │
│                                                               v                      │
│                                          CompiledQuery { EngineQuery, sort, top,     │
│                                                          skip, mode, field_level }   │
│                                                                                      │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌────────────────────────────┐ │
│  │ enum Predicate       │  │ enum Occurrence      │  │ enum EngineQuery           │ │
│  │ • Simple             │  │ • Default (≈Should)  │  │ • MatchAll / MatchNone     │ │
│  │ • Range              │  │ • Should             │  │ • Term / Fuzzy / Range     │ │
│  │ • Logical            │  │ • Must / MustNot     │  │ • Bool(Vec<(Occur, Q)>)    │ │
│  └──────────────────────┘  └──────────────────────┘  └────────────────────────────┘ │
└──────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────── EXECUTION LAYER ──────────────────────────────────┐
│                                                                                      │
│  PaginatedExecutor                                                                   │
│     │  budgets: GrowthBudgets [100, 1000, 10000, 0=rest]                             │
│     │                                                                                │
│     ├──acquires──> ReaderPool ──> IndexReaderFrame (released on drop)                │
│     │                                   │                                            │
│     │                                   └──wraps──> dyn IndexSearcher                │
│     │                                                   ^                            │
│     │                                   MemoryIndex ──publishes──> IndexSnapshot     │
│     │                                   (Roaring postings, fst term dictionaries)    │
│     │                                                                                │
│     └──asks──> dyn PermissionFilter                                                  │
│                     │                                                                │
│                     └── AclPermissionFilter ──reads──> dyn SecurityProvider          │
│                              allow & !deny ──> AccessLevel                           │
│                              Denied < See < Preview < Open < OpenMinor               │
└──────────────────────────────────────────────────────────────────────────────────────┘
*/
