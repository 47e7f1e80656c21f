#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // === HOURS MESSAGES ===
    HoursRecorded { ticket: i64, hours: String, worker: String },
    HoursUpdated(usize),           // edited entries
    HoursRemoved(usize),           // removed entries
    HoursDeletedForTicket(i64),    // ticket id
    HoursByComment(usize, i64),    // entries created, ticket id
    HoursLoggedComment { url: String, hours: String, worker: String, comments: String },
    InvalidHours,
    NegativeHours(i64),
    TotalsRecomputed(usize),
    TimeEntryNotFound(i64),
    NoHoursFound,
    HoursWorkedBy { hours: String, worker: String },

    // === TICKET MESSAGES ===
    TicketCreated(i64),
    TicketDeleted(i64),
    TicketNotFound(i64),
    CommentSaved(i64),
    EstimatedHoursNotDefined,
    EstimatedHoursNotANumber,
    EstimatedHoursNegative,
    EstimatedHoursUpdated(i64, String),
    MilestoneCreated(String),
    TicketChildAdded(i64, i64),    // parent, child

    // === QUERY MESSAGES ===
    QueryNotFound(i64),
    QueryIdNotInteger(String),
    QuerySaved(i64),
    QueryDeleted(i64),
    NoQueriesFound,
    ConfirmDeleteQuery(String),
    OperationCancelled,
    QueryCacheHit(usize),
    QueryCacheRefreshed(usize),
    DefaultQueryUsed(String),
    DoubleCountWarning,
    InvalidDate(String),
    InvalidConstraint(String),

    // === REPORT MESSAGES ===
    ReportTitle { project: String, from: String, to: String },
    HoursFor(String),
    HoursForProject(String),
    HoursForTicket(i64),
    Hours,
    ExportCompleted(String),

    // === PERMISSION MESSAGES ===
    AnonymousUser,

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    PromptProjectName,
    PromptBaseUrl,
    PromptDefaultUser,
    PromptDefaultQuery,
    PromptCacheTtl,
    PromptRelations,
    PromptQueryTitle,
    PromptQueryDescription,
    PromptQuery,

    // === DATABASE MESSAGES ===
    UnknownRoute(String),

    // === MIGRATION MESSAGES ===
    MigrationsFound(usize),        // count
    RunningMigration(u32, String), // version, name
    MigrationCompleted(u32),       // version
    MigrationFailed(u32, String),  // version, error
    AllMigrationsCompleted,
    DatabaseVersion(u32),
    DatabaseUpToDate,
    DatabaseNeedsUpdate,
    MigrationHistory,
}
