//! Diesel schema for planning persistence.

diesel::table! {
    /// Tenants owning projects.
    organizations (id) {
        /// Organization identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Unique URL slug.
        #[max_length = 255]
        slug -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User roles inside organizations.
    organization_members (organization_id, user_id) {
        /// Organization joined.
        organization_id -> Uuid,
        /// Member.
        user_id -> Uuid,
        /// Role held.
        #[max_length = 20]
        role -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Projects, the scope of task orderings.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Owning organization.
        organization_id -> Uuid,
        /// Project name.
        #[max_length = 255]
        name -> Varchar,
        /// Free-form description.
        description -> Nullable<Text>,
        /// Lifecycle stage.
        #[max_length = 20]
        status -> Varchar,
        /// Planned start.
        start_date -> Nullable<Date>,
        /// Planned end.
        end_date -> Nullable<Date>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks with their Gantt and board positions.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Parent task for subtasks.
        parent_id -> Nullable<Uuid>,
        /// Task name.
        #[max_length = 255]
        name -> Varchar,
        /// Free-form description.
        description -> Nullable<Text>,
        /// Creating user.
        creator_id -> Nullable<Uuid>,
        /// Assigned user.
        assignee_id -> Nullable<Uuid>,
        /// Board column.
        #[max_length = 20]
        status -> Varchar,
        /// Urgency.
        #[max_length = 20]
        priority -> Varchar,
        /// Completion percentage.
        percent_complete -> Int4,
        /// Planned start.
        start_date -> Nullable<Date>,
        /// Planned finish.
        due_date -> Nullable<Date>,
        /// Dense position in the project's Gantt sequence.
        gantt_order -> Int4,
        /// Dense position in the board column.
        board_order -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed dependency edges between tasks.
    task_dependencies (id) {
        /// Edge identifier.
        id -> Uuid,
        /// Predecessor task.
        task_id -> Uuid,
        /// Dependent task.
        dependent_task_id -> Uuid,
        /// Relationship type.
        #[max_length = 30]
        dependency_type -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Explicit permission grants on projects and tasks.
    permissions (id) {
        /// Grant identifier.
        id -> Uuid,
        /// Grantee.
        user_id -> Uuid,
        /// `project` or `task`.
        #[max_length = 20]
        resource_type -> Varchar,
        /// Identifier of the covered row.
        resource_id -> Uuid,
        /// Level granted.
        #[max_length = 20]
        permission_level -> Varchar,
        /// Issuing user.
        granted_by -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tokenized links for external viewers.
    shared_links (id) {
        /// Link identifier.
        id -> Uuid,
        /// Opaque lookup token.
        #[max_length = 64]
        token -> Varchar,
        /// `project` or `task`.
        #[max_length = 20]
        resource_type -> Varchar,
        /// Identifier of the shared row.
        resource_id -> Uuid,
        /// Sharing user.
        creator_id -> Nullable<Uuid>,
        /// Expiry instant.
        expires_at -> Nullable<Timestamptz>,
        /// Granted actions as a JSON object.
        permissions -> Jsonb,
        /// Redemption limit.
        max_uses -> Nullable<Int4>,
        /// Redemptions so far.
        use_count -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Messages queued for external recipients.
    external_notifications (id) {
        /// Notification identifier.
        id -> Uuid,
        /// Task the message is about.
        task_id -> Uuid,
        /// Recipient address.
        #[max_length = 255]
        recipient_email -> Varchar,
        /// Recipient display name.
        #[max_length = 255]
        recipient_name -> Nullable<Varchar>,
        /// Subject line.
        #[max_length = 255]
        subject -> Varchar,
        /// Message body.
        content -> Text,
        /// Delivery state.
        #[max_length = 20]
        status -> Varchar,
        /// Reason for the message.
        #[max_length = 30]
        notification_type -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(organization_members -> organizations (organization_id));
diesel::joinable!(projects -> organizations (organization_id));
diesel::joinable!(tasks -> projects (project_id));
diesel::joinable!(external_notifications -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    organization_members,
    projects,
    tasks,
    task_dependencies,
    permissions,
    shared_links,
    external_notifications,
);
