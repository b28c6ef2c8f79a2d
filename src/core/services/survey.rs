use super::{authenticated, check_len, non_blank};
use crate::core::models::{
    option::{Insert as OptionInsert, Query as OptionQuery, SurveyOption, OPTION_MAX_LEN},
    survey::{Insert as SurveyInsert, PublicSurvey, Survey, SurveyCreate, SurveyDetail, Update as SurveyUpdate, MAX_OPTIONS, MIN_OPTIONS, TITLE_MAX_LEN},
};
use crate::core::ports::repository::{finish, OptionCommon, ResponseCommon, Store, SurveyCommon, TxStore};
use crate::core::tally::{tally_survey, OptionCounts, TallyEntry};
use crate::error::Error;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct SurveyResults {
    pub survey_id: i32,
    pub survey_title: String,
    pub is_active: bool,
    pub total_responses: i64,
    pub results: OptionCounts,
    pub options: Vec<TallyEntry>,
}

struct ValidCreate {
    title: String,
    description: Option<String>,
    options: Vec<String>,
}

fn validate_title(title: Option<String>) -> Result<String, Error> {
    let title = non_blank(title).ok_or(Error::MissingTitle)?;
    check_len(&title, "title", TITLE_MAX_LEN)?;
    Ok(title)
}

fn validate_create(create: SurveyCreate) -> Result<ValidCreate, Error> {
    let title = validate_title(create.title)?;
    let n = create.options.len();
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&n) {
        return Err(Error::InvalidOptionCount(n));
    }
    let mut seen = HashSet::new();
    let mut options = Vec::with_capacity(n);
    for text in create.options {
        let text = non_blank(Some(text)).ok_or(Error::BlankOption)?;
        check_len(&text, "option", OPTION_MAX_LEN)?;
        if !seen.insert(text.clone()) {
            return Err(Error::DuplicateOption(text));
        }
        options.push(text);
    }
    Ok(ValidCreate {
        title,
        description: non_blank(create.description),
        options,
    })
}

async fn options_of<S>(store: &mut S, survey_ids: Vec<i32>) -> Result<Vec<SurveyOption>, Error>
where
    S: OptionCommon,
{
    OptionCommon::query(store, &OptionQuery { survey_id_in: survey_ids }).await
}

async fn detail_of<S>(store: &mut S, survey: Survey) -> Result<SurveyDetail, Error>
where
    S: OptionCommon,
{
    let options = options_of(store, vec![survey.id]).await?;
    Ok(SurveyDetail { survey, options })
}

async fn create_in<T>(tx: &mut T, caller: Option<i32>, create: SurveyCreate) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    let owner = authenticated(caller)?;
    let ValidCreate { title, description, options } = validate_create(create)?;
    let survey = SurveyCommon::insert(tx, SurveyInsert { user_id: owner, title, description }).await?;
    let mut created = Vec::with_capacity(options.len());
    for (i, option_text) in options.into_iter().enumerate() {
        let opt = OptionCommon::insert(
            tx,
            OptionInsert {
                survey_id: survey.id,
                option_text,
                option_order: i as i32 + 1,
            },
        )
        .await?;
        created.push(opt);
    }
    Ok(SurveyDetail { survey, options: created })
}

/// Creates the survey and its options in one transaction, ordered as given.
pub async fn create_survey<T>(mut tx: T, caller: Option<i32>, create: SurveyCreate) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    let res = create_in(&mut tx, caller, create).await;
    let detail = finish(tx, res).await?;
    log::info!("user {} created survey {} with {} options", detail.survey.user_id, detail.survey.id, detail.options.len());
    Ok(detail)
}

pub async fn get_survey<S>(store: &mut S, caller: Option<i32>, id: i32) -> Result<SurveyDetail, Error>
where
    S: Store,
{
    let owner = authenticated(caller)?;
    let survey = SurveyCommon::get(store, owner, id).await?.ok_or(Error::NotFound)?;
    detail_of(store, survey).await
}

pub async fn list_surveys<S>(store: &mut S, caller: Option<i32>) -> Result<Vec<SurveyDetail>, Error>
where
    S: Store,
{
    let owner = authenticated(caller)?;
    let surveys = SurveyCommon::query(store, owner).await?;
    if surveys.is_empty() {
        return Ok(Vec::new());
    }
    let mut options: HashMap<i32, Vec<SurveyOption>> = options_of(store, surveys.iter().map(|s| s.id).collect())
        .await?
        .into_iter()
        .map(|o| (o.survey_id, o))
        .into_group_map();
    Ok(surveys
        .into_iter()
        .map(|survey| SurveyDetail {
            options: options.remove(&survey.id).unwrap_or_default(),
            survey,
        })
        .collect())
}

async fn update_in<T>(tx: &mut T, owner: i32, id: i32, mut update: SurveyUpdate) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    if update.title.is_some() {
        update.title = Some(validate_title(update.title)?);
    }
    update.description = update.description.map(non_blank);
    let survey = SurveyCommon::update(tx, owner, id, update).await?.ok_or(Error::NotFound)?;
    detail_of(tx, survey).await
}

/// Changes only the fields present in `update`.
pub async fn update_survey<T>(mut tx: T, caller: Option<i32>, id: i32, update: SurveyUpdate) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    let owner = authenticated(caller)?;
    let res = update_in(&mut tx, owner, id, update).await;
    let detail = finish(tx, res).await?;
    log::info!("user {} updated survey {}", owner, id);
    Ok(detail)
}

async fn toggle_in<T>(tx: &mut T, owner: i32, id: i32) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    let survey = SurveyCommon::toggle(tx, owner, id).await?.ok_or(Error::NotFound)?;
    detail_of(tx, survey).await
}

/// Flips between active and inactive.
pub async fn toggle_survey<T>(mut tx: T, caller: Option<i32>, id: i32) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    let owner = authenticated(caller)?;
    let res = toggle_in(&mut tx, owner, id).await;
    let detail = finish(tx, res).await?;
    log::info!("user {} {} survey {}", owner, if detail.survey.is_active { "activated" } else { "deactivated" }, id);
    Ok(detail)
}

async fn delete_in<T>(tx: &mut T, owner: i32, id: i32) -> Result<(u64, u64), Error>
where
    T: TxStore,
{
    if SurveyCommon::get(tx, owner, id).await?.is_none() {
        return Err(Error::NotFound);
    }
    let responses = ResponseCommon::delete_by_survey(tx, id).await?;
    let options = OptionCommon::delete_by_survey(tx, id).await?;
    if !SurveyCommon::delete(tx, owner, id).await? {
        return Err(Error::NotFound);
    }
    Ok((options, responses))
}

/// Removes the survey with its options and responses.
pub async fn delete_survey<T>(mut tx: T, caller: Option<i32>, id: i32) -> Result<(), Error>
where
    T: TxStore,
{
    let owner = authenticated(caller)?;
    let res = delete_in(&mut tx, owner, id).await;
    let (options, responses) = finish(tx, res).await?;
    log::info!("user {} deleted survey {} ({} options, {} responses)", owner, id, options, responses);
    Ok(())
}

/// Active survey for respondents, whoever owns it.
pub async fn public_survey<S>(store: &mut S, id: i32) -> Result<PublicSurvey, Error>
where
    S: Store,
{
    let survey = SurveyCommon::get_active(store, id).await?.ok_or(Error::SurveyInactiveOrMissing)?;
    Ok(detail_of(store, survey).await?.into())
}

pub async fn survey_results<S>(store: &mut S, caller: Option<i32>, id: i32) -> Result<SurveyResults, Error>
where
    S: Store,
{
    let owner = authenticated(caller)?;
    let survey = SurveyCommon::get(store, owner, id).await?.ok_or(Error::NotFound)?;
    let tally = tally_survey(store, survey.id).await?;
    Ok(SurveyResults {
        survey_id: survey.id,
        survey_title: survey.title,
        is_active: survey.is_active,
        total_responses: tally.total,
        results: tally.results(),
        options: tally.entries,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::response::Submit;
    use crate::core::ports::repository::Manager;
    use crate::core::services::response::submit_response;
    use crate::database::memory::MemoryManager;

    const ALICE: i32 = 1;
    const BOB: i32 = 2;

    fn create(title: &str, options: &[&str]) -> SurveyCreate {
        SurveyCreate {
            title: Some(title.into()),
            description: Some("about".into()),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    async fn counts(manager: &MemoryManager) -> (i64, i64, i64) {
        let mut db = manager.db().await.unwrap();
        (
            SurveyCommon::count(&mut db).await.unwrap(),
            OptionCommon::count(&mut db, None).await.unwrap(),
            ResponseCommon::count(&mut db, None).await.unwrap(),
        )
    }

    async fn respond(manager: &MemoryManager, survey_id: i32, option_id: i32) -> Result<(), Error> {
        submit_response(
            manager.tx().await?,
            survey_id,
            Submit {
                option_id: Some(option_id),
                email: None,
            },
        )
        .await
        .map(|_| ())
    }

    #[tokio::test]
    async fn test_create_assigns_order_by_position() {
        let manager = MemoryManager::new();
        for n in MIN_OPTIONS..=MAX_OPTIONS {
            let texts: Vec<String> = (0..n).map(|i| format!("option {}", i)).collect();
            let refs: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
            let detail = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &refs)).await.unwrap();
            assert_eq!(detail.options.len(), n);
            for (i, opt) in detail.options.iter().enumerate() {
                assert_eq!(opt.option_order, i as i32 + 1);
                assert_eq!(opt.option_text, texts[i]);
            }
            let fetched = get_survey(&mut manager.db().await.unwrap(), Some(ALICE), detail.survey.id).await.unwrap();
            assert_eq!(fetched.options, detail.options);
            assert!(fetched.survey.is_active);
        }
    }

    #[tokio::test]
    async fn test_create_rejects_option_count_and_persists_nothing() {
        let manager = MemoryManager::new();
        for options in [vec![], vec!["a"], vec!["a", "b", "c", "d", "e", "f"]] {
            let err = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &options)).await.unwrap_err();
            assert!(matches!(err, Error::InvalidOptionCount(n) if n == options.len()));
        }
        assert_eq!(counts(&manager).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let manager = MemoryManager::new();
        let mut missing = create("", &["a", "b"]);
        let err = create_survey(manager.tx().await.unwrap(), Some(ALICE), missing.clone()).await.unwrap_err();
        assert!(matches!(err, Error::MissingTitle));
        missing.title = None;
        let err = create_survey(manager.tx().await.unwrap(), Some(ALICE), missing).await.unwrap_err();
        assert!(matches!(err, Error::MissingTitle));
        let err = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["a", "  "])).await.unwrap_err();
        assert!(matches!(err, Error::BlankOption));
        let err = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["a", " a "])).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateOption(ref o) if o == "a"));
        let err = create_survey(manager.tx().await.unwrap(), Some(ALICE), create(&"x".repeat(201), &["a", "b"])).await.unwrap_err();
        assert!(matches!(err, Error::TooLong("title", 200)));
        let long = "y".repeat(201);
        let err = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["a", &long])).await.unwrap_err();
        assert!(matches!(err, Error::TooLong("option", 200)));
        let fits = "y".repeat(200);
        let ok = create_survey(manager.tx().await.unwrap(), Some(BOB), create("t", &["a", &fits])).await.unwrap();
        assert_eq!(ok.options[1].option_text.chars().count(), 200);
        delete_survey(manager.tx().await.unwrap(), Some(BOB), ok.survey.id).await.unwrap();
        let err = create_survey(manager.tx().await.unwrap(), None, create("t", &["a", "b"])).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
        assert_eq!(counts(&manager).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_non_owner_sees_not_found() {
        let manager = MemoryManager::new();
        let id = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["a", "b"])).await.unwrap().survey.id;

        let err = get_survey(&mut manager.db().await.unwrap(), Some(BOB), id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
        let missing = get_survey(&mut manager.db().await.unwrap(), Some(BOB), id + 100).await.unwrap_err();
        assert_eq!(err.to_string(), missing.to_string());

        let update = SurveyUpdate {
            title: Some("hijacked".into()),
            ..Default::default()
        };
        assert!(matches!(update_survey(manager.tx().await.unwrap(), Some(BOB), id, update).await, Err(Error::NotFound)));
        assert!(matches!(toggle_survey(manager.tx().await.unwrap(), Some(BOB), id).await, Err(Error::NotFound)));
        assert!(matches!(survey_results(&mut manager.db().await.unwrap(), Some(BOB), id).await, Err(Error::NotFound)));
        assert!(matches!(delete_survey(manager.tx().await.unwrap(), Some(BOB), id).await, Err(Error::NotFound)));

        let detail = get_survey(&mut manager.db().await.unwrap(), Some(ALICE), id).await.unwrap();
        assert_eq!(detail.survey.title, "t");
        assert!(detail.survey.is_active);
        assert!(list_surveys(&mut manager.db().await.unwrap(), Some(BOB)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_surveys_with_options() {
        let manager = MemoryManager::new();
        create_survey(manager.tx().await.unwrap(), Some(ALICE), create("first", &["a", "b"])).await.unwrap();
        create_survey(manager.tx().await.unwrap(), Some(BOB), create("other", &["x", "y"])).await.unwrap();
        create_survey(manager.tx().await.unwrap(), Some(ALICE), create("second", &["c", "d", "e"])).await.unwrap();

        let list = list_surveys(&mut manager.db().await.unwrap(), Some(ALICE)).await.unwrap();
        assert_eq!(list.iter().map(|d| d.survey.title.as_str()).collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(list[1].options.iter().map(|o| o.option_text.as_str()).collect::<Vec<_>>(), vec!["c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let manager = MemoryManager::new();
        let id = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["a", "b"])).await.unwrap().survey.id;

        let detail = update_survey(
            manager.tx().await.unwrap(),
            Some(ALICE),
            id,
            SurveyUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(detail.survey.title, "t");
        assert_eq!(detail.survey.description.as_deref(), Some("about"));
        assert!(!detail.survey.is_active);

        let detail = update_survey(
            manager.tx().await.unwrap(),
            Some(ALICE),
            id,
            SurveyUpdate {
                title: Some("renamed".into()),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(detail.survey.title, "renamed");
        assert_eq!(detail.survey.description, None);
        assert!(!detail.survey.is_active);
        assert_eq!(detail.options.len(), 2);

        let err = update_survey(
            manager.tx().await.unwrap(),
            Some(ALICE),
            id,
            SurveyUpdate {
                title: Some(" ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MissingTitle));
    }

    #[tokio::test]
    async fn test_toggle_gates_responses() {
        let manager = MemoryManager::new();
        let detail = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["a", "b"])).await.unwrap();
        let (id, option) = (detail.survey.id, detail.options[0].id);

        respond(&manager, id, option).await.unwrap();
        let toggled = toggle_survey(manager.tx().await.unwrap(), Some(ALICE), id).await.unwrap();
        assert!(!toggled.survey.is_active);

        assert!(matches!(respond(&manager, id, option).await, Err(Error::SurveyInactiveOrMissing)));
        assert!(matches!(public_survey(&mut manager.db().await.unwrap(), id).await, Err(Error::SurveyInactiveOrMissing)));
        // responses recorded before deactivation survive it
        let results = survey_results(&mut manager.db().await.unwrap(), Some(ALICE), id).await.unwrap();
        assert_eq!(results.total_responses, 1);
        assert!(!results.is_active);

        let toggled = toggle_survey(manager.tx().await.unwrap(), Some(ALICE), id).await.unwrap();
        assert!(toggled.survey.is_active);
        respond(&manager, id, option).await.unwrap();
        assert_eq!(public_survey(&mut manager.db().await.unwrap(), id).await.unwrap().options.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let manager = MemoryManager::new();
        let kept = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("kept", &["x", "y"])).await.unwrap();
        let doomed = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("doomed", &["a", "b", "c"])).await.unwrap();
        for opt in &doomed.options {
            respond(&manager, doomed.survey.id, opt.id).await.unwrap();
        }
        respond(&manager, kept.survey.id, kept.options[0].id).await.unwrap();
        assert_eq!(counts(&manager).await, (2, 5, 4));

        delete_survey(manager.tx().await.unwrap(), Some(ALICE), doomed.survey.id).await.unwrap();

        let mut db = manager.db().await.unwrap();
        assert_eq!(OptionCommon::count(&mut db, Some(doomed.survey.id)).await.unwrap(), 0);
        assert_eq!(ResponseCommon::count(&mut db, Some(doomed.survey.id)).await.unwrap(), 0);
        drop(db);
        assert_eq!(counts(&manager).await, (1, 2, 1));
        assert!(matches!(get_survey(&mut manager.db().await.unwrap(), Some(ALICE), doomed.survey.id).await, Err(Error::NotFound)));
        assert!(matches!(delete_survey(manager.tx().await.unwrap(), Some(ALICE), doomed.survey.id).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_yes_no_round_trip() {
        let manager = MemoryManager::new();
        let detail = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["Yes", "No"])).await.unwrap();
        respond(&manager, detail.survey.id, detail.options[0].id).await.unwrap();

        let results = survey_results(&mut manager.db().await.unwrap(), Some(ALICE), detail.survey.id).await.unwrap();
        assert_eq!(results.results, OptionCounts(vec![("Yes".to_owned(), 1), ("No".to_owned(), 0)]));
        assert_eq!(results.total_responses, 1);
    }

    #[tokio::test]
    async fn test_tally_is_repeatable() {
        let manager = MemoryManager::new();
        let detail = create_survey(manager.tx().await.unwrap(), Some(ALICE), create("t", &["a", "b", "c"])).await.unwrap();
        respond(&manager, detail.survey.id, detail.options[2].id).await.unwrap();
        respond(&manager, detail.survey.id, detail.options[2].id).await.unwrap();

        let mut db = manager.db().await.unwrap();
        let first = tally_survey(&mut db, detail.survey.id).await.unwrap();
        let second = tally_survey(&mut db, detail.survey.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.entries.len(), 3);
        assert_eq!(first.total, 2);
        drop(db);
        assert_eq!(counts(&manager).await, (1, 3, 2));
    }
}
