//! Shared repository shape for the user-owned label entities (Tag, Character).
//!
//! Both entities are a named record scoped to its creator with a
//! many-to-many link to series, so the whole repository is generated from
//! one macro. Name uniqueness is intentionally not enforced.

macro_rules! label_repository {
    ($entity:ident, $create:ident, $repo:ident, $repo_impl:ident,
     $table:literal, $link_table:literal, $link_column:literal) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::FromRow,
        )]
        pub struct $entity {
            pub id: i64,
            pub name: String,
        }

        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, garde::Validate)]
        pub struct $create {
            #[garde(custom(crate::not_blank), length(min = 1, max = 255))]
            pub name: String,
        }

        pub type $repo = $repo_impl<crate::Pool>;

        pub struct $repo_impl<E> {
            executor: E,
        }

        impl<'c, E> $repo_impl<E>
        where
            for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
        {
            pub fn new(executor: E) -> Self {
                Self { executor }
            }

            /// Records owned by `owner`, name-descending. With `assigned_only`
            /// restricts to records linked to at least one series (any
            /// series, not only the owner's), each returned once.
            pub async fn list(
                &self,
                owner: i64,
                assigned_only: bool,
            ) -> crate::error::Result<Vec<$entity>> {
                const SQL_ALL: &str = concat!(
                    "SELECT id, name FROM ",
                    $table,
                    " WHERE user_id = ? ORDER BY name DESC"
                );
                const SQL_ASSIGNED: &str = concat!(
                    "SELECT DISTINCT t.id, t.name FROM ",
                    $table,
                    " t JOIN ",
                    $link_table,
                    " l ON l.",
                    $link_column,
                    " = t.id WHERE t.user_id = ? ORDER BY t.name DESC"
                );
                let sql = if assigned_only { SQL_ASSIGNED } else { SQL_ALL };
                let records = sqlx::query_as::<_, $entity>(sql)
                    .bind(owner)
                    .fetch_all(&self.executor)
                    .await?;
                Ok(records)
            }

            pub async fn create(
                &self,
                owner: i64,
                payload: $create,
            ) -> crate::error::Result<$entity> {
                const SQL: &str =
                    concat!("INSERT INTO ", $table, " (name, user_id) VALUES (?, ?)");
                let result = sqlx::query(SQL)
                    .bind(&payload.name)
                    .bind(owner)
                    .execute(&self.executor)
                    .await?;
                self.get(owner, result.last_insert_rowid()).await
            }

            pub async fn get(&self, owner: i64, id: i64) -> crate::error::Result<$entity> {
                const SQL: &str = concat!(
                    "SELECT id, name FROM ",
                    $table,
                    " WHERE id = ? AND user_id = ?"
                );
                sqlx::query_as::<_, $entity>(SQL)
                    .bind(id)
                    .bind(owner)
                    .fetch_optional(&self.executor)
                    .await?
                    .ok_or_else(|| crate::Error::RecordNotFound(stringify!($entity).to_string()))
            }

            pub async fn update(
                &self,
                owner: i64,
                id: i64,
                payload: $create,
            ) -> crate::error::Result<$entity> {
                const SQL: &str = concat!(
                    "UPDATE ",
                    $table,
                    " SET name = ? WHERE id = ? AND user_id = ?"
                );
                let result = sqlx::query(SQL)
                    .bind(&payload.name)
                    .bind(id)
                    .bind(owner)
                    .execute(&self.executor)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(crate::Error::RecordNotFound(
                        stringify!($entity).to_string(),
                    ));
                }
                self.get(owner, id).await
            }
        }
    };
}

pub(crate) use label_repository;
