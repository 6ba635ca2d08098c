//! The active patient context.

use crate::config::CoreContext;
use crate::error::RecordResult;
use crate::forms::{HistoryForm, SingletonForm};
use crate::records::{AdmissionDischarge, OrientationAssessment, Patient, PersonalData};
use std::sync::Arc;

/// One patient's chart: the gateway to every record form.
///
/// Open a chart with the patient resolved by
/// [`IdentityService`](crate::identity::IdentityService); every accessor
/// then loads a fresh form scoped to that patient's id, so a caller can
/// never mix records across patients.
pub struct PatientChart {
    ctx: Arc<CoreContext>,
    patient: Patient,
}

impl PatientChart {
    pub fn open(ctx: Arc<CoreContext>, patient: Patient) -> Self {
        Self { ctx, patient }
    }

    /// The patient whose records this chart reaches.
    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    /// Load the personal data form.
    pub async fn personal_data(&self) -> RecordResult<SingletonForm<PersonalData>> {
        SingletonForm::load(Arc::clone(&self.ctx), self.patient.id).await
    }

    /// Load the orientation checklist form.
    pub async fn orientation(&self) -> RecordResult<SingletonForm<OrientationAssessment>> {
        SingletonForm::load(Arc::clone(&self.ctx), self.patient.id).await
    }

    /// Load the admission and discharge form.
    pub async fn admission_discharge(&self) -> RecordResult<SingletonForm<AdmissionDischarge>> {
        SingletonForm::load(Arc::clone(&self.ctx), self.patient.id).await
    }

    /// Load the history form with its full section catalog.
    pub async fn history(&self) -> RecordResult<HistoryForm> {
        HistoryForm::load(Arc::clone(&self.ctx), self.patient.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::identity::IdentityService;
    use crate::numbers::DailySequenceSource;
    use crate::records::{Gender, HistorySectionKind, NewPatient, OrientationQuestion};
    use crate::store::{Filter, MemoryStore, QueryClient, Row, StoreError, Table};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    fn context_over(client: Arc<dyn QueryClient>, max_attempts: u32) -> Arc<CoreContext> {
        Arc::new(CoreContext::new(
            client,
            Arc::new(DailySequenceSource::new()),
            RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_secs(1))
                .expect("valid test policy"),
        ))
    }

    #[tokio::test]
    async fn a_registered_patient_accumulates_records_across_forms() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context_over(Arc::clone(&store) as Arc<dyn QueryClient>, 2);
        let identity = IdentityService::new(Arc::clone(&ctx));

        let request =
            NewPatient::new("Jane Doe", 34, Gender::Female).expect("valid registration");
        let registered = identity.register(request).await.expect("register succeeds");

        let found = identity
            .find_by_number(&registered.patient_number)
            .await
            .expect("lookup succeeds")
            .expect("the registered patient is found");
        assert_eq!(found.id, registered.id);
        assert_eq!(found.full_name.as_str(), "Jane Doe");

        let chart = PatientChart::open(Arc::clone(&ctx), found);

        let mut personal = chart.personal_data().await.expect("form loads");
        personal.edit(|data| {
            data.first_name = "Jane".into();
            data.last_name = "Doe".into();
            data.city = "Santaka".into();
        });
        personal.save().await.expect("personal data saves");

        let mut orientation = chart.orientation().await.expect("form loads");
        orientation.edit(|assessment| {
            assessment
                .questions
                .insert(OrientationQuestion::OrientedToPerson, true);
            assessment
                .questions
                .insert(OrientationQuestion::OrientedToPlace, true);
        });
        orientation.save().await.expect("orientation saves");

        let mut history = chart.history().await.expect("form loads");
        history.edit_section(HistorySectionKind::Complains, |section| {
            section.content = "intermittent headaches".into();
        });
        history
            .save_section(HistorySectionKind::Complains)
            .await
            .expect("history section saves");

        // A fresh chart sees everything that was saved.
        let reopened = PatientChart::open(
            Arc::clone(&ctx),
            identity
                .find_by_number(&registered.patient_number)
                .await
                .expect("lookup succeeds")
                .expect("still found"),
        );
        let personal = reopened.personal_data().await.expect("form reloads");
        assert_eq!(personal.draft().city, "Santaka");
        assert!(!personal.is_dirty());

        let orientation = reopened.orientation().await.expect("form reloads");
        assert_eq!(
            orientation
                .draft()
                .questions
                .get(&OrientationQuestion::OrientedToPerson),
            Some(&true)
        );

        let history = reopened.history().await.expect("form reloads");
        assert_eq!(
            history.section(HistorySectionKind::Complains).content,
            "intermittent headaches"
        );

        // One row per record type, no duplicates anywhere.
        for (table, expected) in [
            (Table::Patients, 1),
            (Table::PersonalData, 1),
            (Table::History, 1),
            (Table::Orientation, 1),
        ] {
            let rows = store
                .select(table, &[])
                .await
                .expect("select should succeed");
            assert_eq!(rows.len(), expected, "{table} row count");
        }
    }

    #[tokio::test]
    async fn charts_never_mix_patients() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context_over(Arc::clone(&store) as Arc<dyn QueryClient>, 2);
        let identity = IdentityService::new(Arc::clone(&ctx));

        let first = identity
            .register(NewPatient::new("Jane Doe", 34, Gender::Female).expect("valid"))
            .await
            .expect("register succeeds");
        let second = identity
            .register(NewPatient::new("John Roe", 41, Gender::Male).expect("valid"))
            .await
            .expect("register succeeds");

        let mut janes = PatientChart::open(Arc::clone(&ctx), first)
            .personal_data()
            .await
            .expect("form loads");
        janes.edit(|data| data.first_name = "Jane".into());
        janes.save().await.expect("save succeeds");

        let johns = PatientChart::open(Arc::clone(&ctx), second)
            .personal_data()
            .await
            .expect("form loads");
        assert_eq!(
            johns.draft().first_name,
            "",
            "another patient's save must not leak into this chart"
        );
    }

    /// Fails the first `fail_first` storage calls with a transport fault,
    /// then delegates to the wrapped store.
    struct FlakyClient {
        inner: Arc<MemoryStore>,
        fail_first: AtomicU32,
    }

    impl FlakyClient {
        fn faults_remaining(&self) -> bool {
            self.fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok()
        }
    }

    #[async_trait]
    impl QueryClient for FlakyClient {
        async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
            if self.faults_remaining() {
                return Err(StoreError::Transport("connection reset".into()));
            }
            self.inner.select(table, filters).await
        }

        async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
            if self.faults_remaining() {
                return Err(StoreError::Transport("connection reset".into()));
            }
            self.inner.insert(table, row).await
        }

        async fn update(&self, table: Table, id: Uuid, row: Row) -> Result<Row, StoreError> {
            if self.faults_remaining() {
                return Err(StoreError::Transport("connection reset".into()));
            }
            self.inner.update(table, id, row).await
        }
    }

    #[tokio::test]
    async fn transient_storage_faults_are_absorbed_by_the_retry_policy() {
        let flaky = Arc::new(FlakyClient {
            inner: Arc::new(MemoryStore::new()),
            fail_first: AtomicU32::new(2),
        });
        let ctx = context_over(Arc::clone(&flaky) as Arc<dyn QueryClient>, 3);
        let identity = IdentityService::new(Arc::clone(&ctx));

        let registered = identity
            .register(NewPatient::new("Jane Doe", 34, Gender::Female).expect("valid"))
            .await
            .expect("registration should survive two transport faults");

        let found = identity
            .find_by_number(&registered.patient_number)
            .await
            .expect("lookup succeeds")
            .expect("patient found after the connection settles");
        assert_eq!(found.id, registered.id);
    }
}
