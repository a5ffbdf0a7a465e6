pub mod patch;
pub mod routes;

pub mod admin {
    pub mod admin_handlers;
    pub mod admin_models;
}

pub mod dashboard {
    pub mod dashboard_handlers;
}

pub mod dependencies {
    pub mod dependency_handlers;
    pub mod dependency_models;
}

pub mod epics {
    pub mod epic_handlers;
}

pub mod files {
    pub mod file_handlers;
    pub mod file_models;
}

pub mod groups {
    pub mod group_handlers;
}

pub mod labels {
    pub mod label_handlers;
    pub mod label_models;
}

pub mod login {
    pub mod login_handlers;
    pub mod login_models;
}

pub mod milestones {
    pub mod milestone_handlers;
    pub mod milestone_models;
}

pub mod projects {
    pub mod project_handlers;
    pub mod project_models;
}

pub mod releases {
    pub mod release_handlers;
    pub mod release_models;
}

pub mod tasks {
    pub mod task_handlers;
    pub mod task_models;
}

pub mod users {
    pub mod user_handlers;
    pub mod user_models;
}
