use chrono::NaiveDate;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub organization_id: Uuid, pub email: String, pub full_name: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ClaimInputDoc {
    pub claimant_name: Option<String>,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_chargeable: bool,
    pub client_id: Option<Uuid>,
}

#[derive(ToSchema)]
pub struct MileageInputDoc {
    pub start_location: String,
    pub end_location: String,
    pub distance_miles: f64,
    /// home or public
    pub charger_type: Option<String>,
}

#[derive(ToSchema)]
pub struct ExpenseInputDoc {
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub amount_before_vat_pence: i64,
    pub vat_pence: i64,
    pub expense_date: NaiveDate,
    pub receipt_url: Option<String>,
    pub notes: String,
    pub mileage: Option<MileageInputDoc>,
}

#[derive(ToSchema)]
pub struct ReviewRequest { pub approve: bool, pub notes: Option<String> }

#[derive(ToSchema)]
pub struct CategoryInputDoc { pub name: String, pub description: String, pub xero_account_code: Option<String> }

#[derive(ToSchema)]
pub struct ActiveRequest { pub is_active: bool }

#[derive(ToSchema)]
pub struct ClientRequest { pub name: String }

#[derive(ToSchema)]
pub struct RateInputDoc {
    /// standard or electric
    pub vehicle_type: String,
    pub charger_type: Option<String>,
    pub rate_pence_per_mile: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(ToSchema)]
pub struct RateUpdateDoc { pub rate_pence_per_mile: Option<i64>, pub effective_to: Option<NaiveDate> }

#[derive(ToSchema)]
pub struct DisclaimerRequest { pub disclaimer: String }

#[derive(ToSchema)]
pub struct CreateUserDoc {
    pub email: String,
    pub full_name: String,
    /// staff, approver or admin
    pub role: Option<String>,
    pub vehicle_type: Option<String>,
    pub charger_type: Option<String>,
    pub password: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateUserDoc {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub vehicle_type: Option<String>,
    pub charger_type: Option<String>,
    /// active | inactive
    pub status: Option<String>,
    pub password: Option<String>,
}

#[derive(ToSchema)]
pub struct XeroSettingsRequest { pub client_id: String, pub client_secret: Option<String>, pub tenant_id: Option<String> }

#[derive(ToSchema)]
pub struct AuthorizeRequest { pub redirect_uri: String }

#[derive(ToSchema)]
pub struct CallbackRequest { pub code: String, pub redirect_uri: String, pub state: String }

#[derive(ToSchema)]
pub struct SyncClaimsRequest { pub claim_ids: Vec<Uuid> }

#[derive(ToSchema)]
pub struct DirectoryConfigRequest {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub is_enabled: Option<bool>,
}

#[derive(ToSchema)]
pub struct EnabledRequest { pub is_enabled: bool }

#[derive(ToSchema)]
pub struct MappingRequest { pub azure_group_id: String, pub azure_group_name: String, pub application_role: String }

#[derive(ToSchema)]
pub struct DirectorySyncRequest {
    /// full, incremental or manual (default)
    pub sync_type: Option<String>,
}

#[derive(ToSchema)]
pub struct TemplateRequest { pub subject: String, pub body: String }

#[derive(ToSchema)]
pub struct SendEmailRequest {
    pub template_type: String,
    pub claim_id: Uuid,
    pub recipient_email: String,
    pub recipient_name: Option<String>,
    pub reviewer_name: Option<String>,
    pub review_notes: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::claims::list,
        crate::routes::claims::create,
        crate::routes::claims::get,
        crate::routes::claims::update,
        crate::routes::claims::delete,
        crate::routes::claims::submit,
        crate::routes::claims::reopen,
        crate::routes::claims::add_expense,
        crate::routes::claims::update_expense,
        crate::routes::claims::delete_expense,
        crate::routes::claims::approval_queue,
        crate::routes::claims::review,
        crate::routes::catalog::list_categories,
        crate::routes::catalog::create_category,
        crate::routes::catalog::update_category,
        crate::routes::catalog::set_category_active,
        crate::routes::catalog::list_clients,
        crate::routes::catalog::create_client,
        crate::routes::catalog::set_client_active,
        crate::routes::catalog::list_rates,
        crate::routes::catalog::create_rate,
        crate::routes::catalog::update_rate,
        crate::routes::catalog::get_disclaimer,
        crate::routes::catalog::set_disclaimer,
        crate::routes::admin::list_users,
        crate::routes::admin::create_user,
        crate::routes::admin::get_user,
        crate::routes::admin::update_user,
        crate::routes::admin::delete_user,
        crate::routes::admin::list_expenses,
        crate::routes::xero::get_settings,
        crate::routes::xero::save_settings,
        crate::routes::xero::authorize_url,
        crate::routes::xero::callback,
        crate::routes::xero::test_connection,
        crate::routes::xero::queue,
        crate::routes::xero::sync,
        crate::routes::directory::get_config,
        crate::routes::directory::save_config,
        crate::routes::directory::set_enabled,
        crate::routes::directory::list_mappings,
        crate::routes::directory::create_mapping,
        crate::routes::directory::delete_mapping,
        crate::routes::directory::sync,
        crate::routes::directory::list_logs,
        crate::routes::notifications::list_templates,
        crate::routes::notifications::update_template,
        crate::routes::notifications::list_logs,
        crate::routes::notifications::send,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ClaimInputDoc,
            MileageInputDoc,
            ExpenseInputDoc,
            ReviewRequest,
            CategoryInputDoc,
            ActiveRequest,
            ClientRequest,
            RateInputDoc,
            RateUpdateDoc,
            DisclaimerRequest,
            CreateUserDoc,
            UpdateUserDoc,
            XeroSettingsRequest,
            AuthorizeRequest,
            CallbackRequest,
            SyncClaimsRequest,
            DirectoryConfigRequest,
            EnabledRequest,
            MappingRequest,
            DirectorySyncRequest,
            TemplateRequest,
            SendEmailRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "claims"),
        (name = "approvals"),
        (name = "catalog"),
        (name = "admin"),
        (name = "xero"),
        (name = "directory"),
        (name = "notifications")
    )
)]
pub struct ApiDoc;
