use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::Principal,
    domain::{Event, EventForm, EventQuery, EventType, PageRequest, Paginated},
    error::{AppError, Result},
    repository::{EventFilter, EventRepository},
    storage::{discard_blobs, discard_on_error, BlobStore},
};

pub struct EventService {
    repo: Arc<dyn EventRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repo, blobs }
    }

    pub async fn list(&self, query: EventQuery) -> Result<Paginated<Event>> {
        let page = PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = EventFilter {
            event_type: query.event_type,
            from: query.from,
            to: query.to,
        };
        self.repo.list(&filter, page).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Event> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    /// Creates an event from a multipart form. `images` are already stored
    /// and are discarded again if the event cannot be created.
    pub async fn create(&self, form: EventForm, images: Vec<String>, caller: &Principal) -> Result<Event> {
        let result = self.insert(form, images.clone(), caller).await;
        discard_on_error(self.blobs.as_ref(), &images, result).await
    }

    async fn insert(&self, form: EventForm, images: Vec<String>, caller: &Principal) -> Result<Event> {
        form.check(true)?;

        let (Some(title), Some(start_date), Some(end_date)) =
            (form.title.clone(), form.parsed_start()?, form.parsed_end()?)
        else {
            return Err(AppError::BadRequest("Title, start date and end date are required".to_string()));
        };

        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            description: form.description.clone(),
            event_type: form.parsed_event_type()?.unwrap_or(EventType::Service),
            start_date,
            end_date,
            location: form.location.clone(),
            max_attendees: form.parsed_max_attendees()?,
            created_by: caller.email.clone(),
            images,
            created_at: now,
            updated_at: now,
        };

        let event = self.repo.create(event).await?;
        tracing::info!("Event {} created by {}", event.id, caller.email);
        Ok(event)
    }

    /// Applies a partial multipart update. Newly uploaded images replace the
    /// existing ones, whose blobs are removed once the update is stored.
    pub async fn update(&self, id: Uuid, form: EventForm, images: Vec<String>) -> Result<Event> {
        let result = self.apply_update(id, form, images.clone()).await;
        let (event, replaced) = discard_on_error(self.blobs.as_ref(), &images, result).await?;
        discard_blobs(self.blobs.as_ref(), &replaced).await;
        Ok(event)
    }

    async fn apply_update(&self, id: Uuid, form: EventForm, images: Vec<String>) -> Result<(Event, Vec<String>)> {
        form.check(false)?;
        let mut event = self.get(id).await?;

        if let Some(title) = &form.title {
            event.title = title.trim().to_string();
        }
        if form.description.is_some() {
            event.description = form.description.clone();
        }
        if let Some(event_type) = form.parsed_event_type()? {
            event.event_type = event_type;
        }
        if let Some(start) = form.parsed_start()? {
            event.start_date = start;
        }
        if let Some(end) = form.parsed_end()? {
            event.end_date = end;
        }
        if form.location.is_some() {
            event.location = form.location.clone();
        }
        if let Some(max) = form.parsed_max_attendees()? {
            event.max_attendees = Some(max);
        }
        if event.end_date < event.start_date {
            return Err(AppError::invalid("end_date", "End date must be after start date"));
        }

        let replaced = if images.is_empty() {
            Vec::new()
        } else {
            std::mem::replace(&mut event.images, images)
        };
        event.updated_at = Utc::now();

        let event = self.repo.update(event).await?;
        Ok((event, replaced))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let event = self.get(id).await?;
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        discard_blobs(self.blobs.as_ref(), &event.images).await;
        tracing::info!("Event {} deleted", id);
        Ok(())
    }
}
