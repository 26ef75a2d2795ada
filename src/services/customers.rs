use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::customer::{self, Entity as Customer},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Customer directory: CRUD with unique document and email.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 20, message = "Document must be between 1 and 20 characters"))]
    pub document: String,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerPage {
    pub customers: Vec<customer::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let duplicate = Customer::find()
            .filter(
                customer::Column::Document
                    .eq(input.document.clone())
                    .or(customer::Column::Email.eq(input.email.clone())),
            )
            .one(&*self.db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(
                "A customer with this document or email already exists".to_string(),
            ));
        }

        let customer_id = Uuid::new_v4();
        let model = customer::ActiveModel {
            id: Set(customer_id),
            document: Set(input.document),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            city: Set(input.city),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CustomerCreated(customer_id))
            .await;

        info!("Created customer: {}", customer_id);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        search: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<CustomerPage, ServiceError> {
        let mut query = Customer::find().order_by_asc(customer::Column::Name);
        if let Some(term) = search.filter(|t| !t.is_empty()) {
            query = query.filter(
                customer::Column::Name
                    .contains(&term)
                    .or(customer::Column::Document.contains(&term)),
            );
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(CustomerPage {
            customers,
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_customer(id).await?;

        if let Some(email) = &input.email {
            let taken = Customer::find()
                .filter(customer::Column::Email.eq(email.clone()))
                .filter(customer::Column::Id.ne(id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(
                    "A customer with this email already exists".to_string(),
                ));
            }
        }

        let mut model: customer::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(email) = input.email {
            model.email = Set(email);
        }
        if let Some(phone) = input.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(city) = input.city {
            model.city = Set(Some(city));
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CustomerUpdated(id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_customer(id).await?;
        existing.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CustomerDeleted(id))
            .await;

        info!("Deleted customer: {}", id);
        Ok(())
    }
}
