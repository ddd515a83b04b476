//! Example query snippets per data management system.
//!
//! Shown as placeholder code and used when the user submits no code of their
//! own.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};

/// Data management systems offered for code dissection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Dialect {
    #[default]
    #[strum(to_string = "SQL")]
    Sql,
    #[strum(to_string = "PostgreSQL", serialize = "postgres")]
    PostgreSql,
    #[strum(to_string = "MySQL")]
    MySql,
    #[strum(to_string = "GCP BigQuery", serialize = "bigquery")]
    BigQuery,
    #[strum(to_string = "Azure SQL Server", serialize = "sqlserver")]
    SqlServer,
    #[strum(to_string = "Amazon Athena", serialize = "athena")]
    Athena,
    #[strum(to_string = "Amazon Redshift", serialize = "redshift")]
    Redshift,
}

static EXAMPLES: Lazy<HashMap<Dialect, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (Dialect::PostgreSql, POSTGRESQL),
        (Dialect::MySql, MYSQL),
        (Dialect::BigQuery, BIGQUERY),
        (Dialect::SqlServer, SQL_SERVER),
        (Dialect::Athena, ATHENA),
        (Dialect::Redshift, REDSHIFT),
    ])
});

/// Example snippet for `dialect`; the generic SQL example for anything
/// without a dedicated one.
pub fn example_snippet(dialect: Dialect) -> &'static str {
    EXAMPLES.get(&dialect).copied().unwrap_or(GENERIC_SQL)
}

const GENERIC_SQL: &str = r#"-- Replace this text with your code:
SELECT
  CASE
    WHEN salary <= 750000 THEN 'low'
    WHEN salary > 750000 AND salary <= 100000 THEN 'medium'
    WHEN salary > 100000 THEN 'high'
  END AS salary_category,
  COUNT(*) AS number_of_employees
FROM    employee
GROUP BY
  CASE
    WHEN salary <= 750000 THEN 'low'
    WHEN salary > 750000 AND salary <= 100000 THEN 'medium'
    WHEN salary > 100000 THEN 'high'
END
"#;

const POSTGRESQL: &str = r#"- Replace this text with your code:
SELECT
  product,
  grp_name,
  price,
  RANK() OVER (
    PARTITION BY grp_name
    ORDER BY price
  ) AS ranking
FROM
  substances
INNER JOIN products USING (productid);
"#;

const MYSQL: &str = r#"-- Replace this text with your code:
SELECT Department,
       CASE
           WHEN COUNT(*) % 2 = 0 THEN AVG(Salary)
           ELSE
               (SELECT Salary
                FROM Employees e2
                WHERE e1.Department = e2.Department
                ORDER BY Salary
                LIMIT 1 OFFSET COUNT(*) / 2)
       END AS MedianSalary
FROM Employees e1
GROUP BY Department;
"#;

const BIGQUERY: &str = r#"-- Replace this text with your code:
SELECT
  product,
  grp_name,
  price,
  RANK() OVER (
    PARTITION BY grp_name
    ORDER BY price
  ) AS ranking
FROM
  substances
INNER JOIN products USING (productid);
"#;

const SQL_SERVER: &str = r#"-- Replace this text with your code:
DECLARE @emp_id INT = 9;
SELECT orderyear, COUNT(DISTINCT custid) AS cust_count
FROM (    
    SELECT YEAR(orderdate) AS orderyear, custid
    FROM Sales.Orders
    WHERE empid=@emp_id
) AS derived_year
GROUP BY orderyear;
GO
"#;

const ATHENA: &str = r#"-- Replace this text with your code:
WITH dataset AS (
  SELECT ARRAY[
    CAST(
      ROW('aws.amazon.com', ROW(true)) AS ROW(hostname VARCHAR, flaggedActivity ROW(isNew BOOLEAN))
    ),
    CAST(
      ROW('news.cnn.com', ROW(false)) AS ROW(hostname VARCHAR, flaggedActivity ROW(isNew BOOLEAN))
    ),
    CAST(
      ROW('netflix.com', ROW(false)) AS ROW(hostname VARCHAR, flaggedActivity ROW(isNew BOOLEAN))
    )
  ] as items
)
SELECT sites.hostname, sites.flaggedActivity.isNew
FROM dataset, UNNEST(items) t(sites)
WHERE sites.flaggedActivity.isNew = true
"#;

const REDSHIFT: &str = r#"-- Replace this text with your code:
SELECT "table" tablename, skew_rows,
  ROUND(CAST(max_blocks_per_slice AS FLOAT) /
  GREATEST(NVL(min_blocks_per_slice,0)::int,1)::FLOAT,5) storage_skew,
  ROUND(CAST(100*dist_slice AS FLOAT) /
  (SELECT COUNT(DISTINCT slice) FROM stv_slices),2) pct_populated
FROM svv_table_info ti
  JOIN (SELECT tbl, MIN(c) min_blocks_per_slice,
          MAX(c) max_blocks_per_slice,
          COUNT(DISTINCT slice) dist_slice
        FROM (SELECT b.tbl, b.slice, COUNT(*) AS c
              FROM STV_BLOCKLIST b
              GROUP BY b.tbl, b.slice)
        WHERE tbl = 240791 GROUP BY tbl) iq ON iq.tbl = ti.table_id;
"#;
