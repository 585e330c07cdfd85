use crate::common::{fetch_people, initialize_database};
use sqlbatch::batch::{self, BatchConfig, InsertError, InsertResult, InsertSpec};
use sqlbatch::db::{Db, Tx, Value};

const TEMPLATE: &str = "INSERT INTO person (name, age) VALUES (?, ?)";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Person {
    name: Option<&'static str>,
    age: Option<i64>,
}

fn person(name: &'static str, age: i64) -> Person {
    Person {
        name: Some(name),
        age: Some(age),
    }
}

fn spec(people: Vec<Person>) -> InsertSpec<Person, impl Fn(&Person) -> Vec<Value>> {
    InsertSpec::new(TEMPLATE, people, |person: &Person| {
        vec![Value::from(person.name), Value::from(person.age)]
    })
}

/// Two rows per statement for a two-column template.
fn two_rows_per_chunk() -> BatchConfig {
    BatchConfig {
        bind_variable_ceiling: 4,
    }
}

#[async_std::test]
async fn test_insert_when_three_people_expect_ids_match_stored_rows() {
    let db = initialize_database().await;
    let people = vec![person("ada", 36), person("grace", 45), person("edsger", 72)];
    let actual: Vec<InsertResult<Person>> =
        batch::insert(spec(people.clone()), &mut db.conn.context(), &BatchConfig::default())
            .await
            .unwrap();

    let stored = fetch_people(&db.conn).await;
    assert_eq!(actual.len(), 3);
    for (result, (id, name, age)) in actual.iter().zip(&stored) {
        assert_eq!(result.id, u64::try_from(*id).unwrap());
        assert_eq!(result.item.name, Some(name.as_str()));
        assert_eq!(result.item.age, *age);
    }
    let items: Vec<Person> = actual.into_iter().map(|result| result.item).collect();
    assert_eq!(items, people);
}

#[async_std::test]
async fn test_insert_when_several_chunks_expect_contiguous_ids_in_input_order() {
    let db = initialize_database().await;
    sqlx::query("INSERT INTO person (name, age) VALUES ('existing', 1)")
        .execute(&db.conn.pool)
        .await
        .unwrap();
    let people: Vec<Person> = ["a", "b", "c", "d", "e"]
        .into_iter()
        .zip(20..)
        .map(|(name, age)| person(name, age))
        .collect();
    let actual: Vec<InsertResult<Person, i64>> =
        batch::insert(spec(people), &mut db.conn.context(), &two_rows_per_chunk())
            .await
            .unwrap();

    let ids: Vec<i64> = actual.iter().map(|result| result.id).collect();
    assert_eq!(ids, vec![2, 3, 4, 5, 6]);
    let stored: Vec<(i64, String)> = fetch_people(&db.conn)
        .await
        .into_iter()
        .skip(1)
        .map(|(id, name, _)| (id, name))
        .collect();
    let expected: Vec<(i64, String)> = actual
        .into_iter()
        .map(|result| (result.id, result.item.name.unwrap().to_owned()))
        .collect();
    assert_eq!(stored, expected);
}

#[async_std::test]
async fn test_insert_when_second_chunk_fails_expect_first_chunk_committed() {
    let db = initialize_database().await;
    let people = vec![
        person("a", 1),
        person("b", 2),
        person("c", 3),
        Person {
            name: None,
            age: Some(4),
        },
        person("e", 5),
    ];
    let actual = batch::insert::<_, _, _, u64>(spec(people), &mut db.conn.context(), &two_rows_per_chunk())
        .await
        .unwrap_err();

    assert!(
        matches!(actual, InsertError::Exec { chunk: 1, inserted: 2, .. }),
        "unexpected error: {actual}"
    );
    assert!(actual.is_partial());
    let names: Vec<String> = fetch_people(&db.conn)
        .await
        .into_iter()
        .map(|(_, name, _)| name)
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[async_std::test]
async fn test_insert_when_caller_rolls_back_expect_nothing_stored() {
    let db = initialize_database().await;
    let people = vec![person("a", 1), person("b", 2), person("c", 3)];
    let mut tx = db.conn.begin().await.unwrap();
    let actual: Vec<InsertResult<Person>> =
        batch::insert(spec(people), &mut tx.context(), &two_rows_per_chunk())
            .await
            .unwrap();
    assert_eq!(actual.len(), 3);
    tx.rollback().await.unwrap();

    assert!(fetch_people(&db.conn).await.is_empty());
}

#[async_std::test]
async fn test_insert_when_caller_commits_expect_all_chunks_stored() {
    let db = initialize_database().await;
    let people = vec![person("a", 1), person("b", 2), person("c", 3)];
    let mut tx = db.conn.begin().await.unwrap();
    let actual: Vec<InsertResult<Person, i32>> =
        batch::insert(spec(people), &mut tx.context(), &two_rows_per_chunk())
            .await
            .unwrap();
    tx.commit().await.unwrap();

    let stored: Vec<i64> = fetch_people(&db.conn)
        .await
        .into_iter()
        .map(|(id, _, _)| id)
        .collect();
    let ids: Vec<i64> = actual.iter().map(|result| i64::from(result.id)).collect();
    assert_eq!(stored, ids);
}

#[async_std::test]
async fn test_insert_when_caller_transaction_fails_midway_expect_caller_can_discard_all() {
    let db = initialize_database().await;
    let people = vec![
        person("a", 1),
        person("b", 2),
        Person {
            name: None,
            age: None,
        },
    ];
    let mut tx = db.conn.begin().await.unwrap();
    let actual = batch::insert::<_, _, _, u64>(spec(people), &mut tx.context(), &two_rows_per_chunk())
        .await
        .unwrap_err();
    assert_eq!(actual.chunk(), Some(1));
    tx.rollback().await.unwrap();

    assert!(fetch_people(&db.conn).await.is_empty());
}

#[async_std::test]
async fn test_insert_when_90001_rows_with_default_ceiling_expect_ids_match_stored_rows() {
    let db = initialize_database().await;
    let names: Vec<String> = (0..90_001).map(|n| format!("person {n}")).collect();
    let spec = InsertSpec::new(
        "INSERT INTO person (name) VALUES (?)",
        names,
        |name: &String| vec![Value::from(name.as_str())],
    );
    let actual: Vec<InsertResult<String, i64>> =
        batch::insert(spec, &mut db.conn.context(), &BatchConfig::default())
            .await
            .unwrap();

    assert_eq!(actual.len(), 90_001);
    let returned: Vec<(i64, String)> = actual
        .into_iter()
        .map(|result| (result.id, result.item))
        .collect();
    let stored: Vec<(i64, String)> = fetch_people(&db.conn)
        .await
        .into_iter()
        .map(|(id, name, _)| (id, name))
        .collect();
    assert_eq!(returned, stored);
}

#[async_std::test]
async fn test_insert_when_caller_transaction_spans_default_size_chunks_expect_all_stored() {
    let db = initialize_database().await;
    let people: Vec<Person> = (0..40_000).map(|age| person("p", age)).collect();
    let mut tx = db.conn.begin().await.unwrap();
    let actual: Vec<InsertResult<Person, i64>> =
        batch::insert(spec(people), &mut tx.context(), &BatchConfig::default())
            .await
            .unwrap();
    tx.commit().await.unwrap();

    let ids: Vec<i64> = actual.iter().map(|result| result.id).collect();
    let stored: Vec<(i64, Option<i64>)> = fetch_people(&db.conn)
        .await
        .into_iter()
        .map(|(id, _, age)| (id, age))
        .collect();
    let expected: Vec<(i64, Option<i64>)> = actual
        .into_iter()
        .map(|result| (result.id, result.item.age))
        .collect();
    assert_eq!(ids, (1..=40_000).collect::<Vec<i64>>());
    assert_eq!(stored, expected);
}
