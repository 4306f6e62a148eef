//! Diesel schema for the core tables.

diesel::table! {
    /// Registered users.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Unique login name.
        #[max_length = 50]
        username -> Varchar,
        /// Unique normalized email address.
        #[max_length = 255]
        email -> Varchar,
        /// Opaque credential hash.
        password_hash -> Text,
        /// Registration timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Seeded role catalog.
    roles (id) {
        /// Stable role identifier.
        id -> Int4,
        /// Role name.
        #[max_length = 20]
        name -> Varchar,
    }
}

diesel::table! {
    /// Projects.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 100]
        name -> Varchar,
        /// Optional free-form description.
        description -> Nullable<Text>,
        /// Optional planned start date.
        start_date -> Nullable<Date>,
        /// Creating user.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Project memberships.
    project_members (id) {
        /// Membership identifier.
        id -> Uuid,
        /// Project the user belongs to.
        project_id -> Uuid,
        /// Enrolled user.
        user_id -> Uuid,
        /// Role held in the project.
        role_id -> Int4,
        /// Enrollment timestamp.
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 200]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Workflow status.
        #[max_length = 20]
        status -> Varchar,
        /// Priority.
        #[max_length = 20]
        priority -> Varchar,
        /// Owning project.
        project_id -> Uuid,
        /// Optional assignee.
        assignee_id -> Nullable<Uuid>,
        /// Creating user.
        creator_id -> Uuid,
        /// Optional due date.
        due_date -> Nullable<Date>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only task history.
    task_history (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Insertion sequence used for ledger ordering.
        seq -> Int8,
        /// Task the entry describes, if it still exists.
        task_id -> Nullable<Uuid>,
        /// Project the task belonged to.
        project_id -> Nullable<Uuid>,
        /// Acting user.
        user_id -> Nullable<Uuid>,
        /// Recorded action.
        #[max_length = 30]
        action -> Varchar,
        /// Value before the change.
        old_value -> Nullable<Text>,
        /// Value after the change.
        new_value -> Nullable<Text>,
        /// Recording timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User notifications.
    notifications (id) {
        /// Notification identifier.
        id -> Uuid,
        /// Recipient.
        user_id -> Uuid,
        /// Short title.
        #[max_length = 255]
        title -> Varchar,
        /// Message body.
        message -> Text,
        /// Notification type tag.
        #[max_length = 50]
        notification_type -> Varchar,
        /// Read flag.
        is_read -> Bool,
        /// Project context.
        project_id -> Nullable<Uuid>,
        /// Related entity kind.
        #[max_length = 20]
        related_entity_type -> Nullable<Varchar>,
        /// Related entity identifier.
        related_entity_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    roles,
    projects,
    project_members,
    tasks,
    task_history,
    notifications,
);
