//! Built-in content: the static question bank, static theory pages, the
//! canned fallbacks used when the AI provider fails, and the mock
//! leaderboard roster.
//!
//! Static bank entries keep common topics instant and free of AI calls.

use std::collections::HashMap;

use crate::domain::{
  Difficulty, EvaluationResult, LeaderboardEntry, QuestionKind, QuestionSource, QuizQuestion,
};

fn bank_question(
  id: &str,
  topic: &str,
  difficulty: Difficulty,
  question_text: &str,
  schema_context: &str,
  hints: &[&str],
) -> QuizQuestion {
  QuizQuestion {
    id: id.into(),
    topic: topic.into(),
    difficulty,
    kind: QuestionKind::QueryWriting,
    source: QuestionSource::StaticBank,
    question_text: question_text.into(),
    schema_context: schema_context.into(),
    hints: hints.iter().map(|h| h.to_string()).collect(),
    options: None,
  }
}

/// Pre-authored questions keyed by topic slug. Topics absent here
/// (e.g. data_modeling) always go through AI generation.
pub fn static_questions() -> HashMap<String, Vec<QuizQuestion>> {
  let mut bank = HashMap::new();
  bank.insert(
    "window_functions".to_string(),
    vec![
      bank_question(
        "wf_1",
        "Window Functions",
        Difficulty::Intermediate,
        "Write a query to rank employees by salary within each department. Use `DENSE_RANK()` so that if two employees have the same salary, they share the same rank, and the next rank is sequential.",
        "Table: EMPLOYEES\n- EMP_ID (INT)\n- NAME (VARCHAR)\n- DEPT_ID (INT)\n- SALARY (INT)",
        &["Use PARTITION BY to group by department", "Use ORDER BY to sort by salary descending"],
      ),
      bank_question(
        "wf_2",
        "Window Functions",
        Difficulty::Advanced,
        "Calculate the 'Running Total' of sales for each sales representative, ordered by the date of sale.",
        "Table: SALES\n- SALE_ID (INT)\n- REP_ID (INT)\n- SALE_DATE (DATE)\n- AMOUNT (DECIMAL)",
        &["Use SUM() as a window function", "The frame should be UNBOUNDED PRECEDING to CURRENT ROW"],
      ),
    ],
  );
  bank.insert(
    "subqueries".to_string(),
    vec![
      bank_question(
        "sq_1",
        "Subqueries",
        Difficulty::Intermediate,
        "Find the names of all products that have a price higher than the average price of ALL products.",
        "Table: PRODUCTS\n- PROD_ID (INT)\n- PROD_NAME (VARCHAR)\n- PRICE (DECIMAL)",
        &["Calculate the average price in a subquery", "Use > operator with the scalar result"],
      ),
      bank_question(
        "sq_2",
        "Subqueries",
        Difficulty::Advanced,
        "List employees who earn more than the average salary of their respective department (Correlated Subquery).",
        "Table: EMPLOYEES\n- EMP_ID (INT)\n- NAME (VARCHAR)\n- DEPT_ID (INT)\n- SALARY (INT)",
        &["The inner query needs to reference the outer query's department ID", "This creates an 'Outer Reference'"],
      ),
    ],
  );
  bank.insert(
    "normalization".to_string(),
    vec![bank_question(
      "norm_1",
      "Normalization",
      Difficulty::Intermediate,
      "Given a table `STUDENT_CLASSES (Student_ID, Student_Name, Class_ID, Class_Name)`, identify the partial dependency and write the SQL to split it into 2NF.",
      "Current PK: (Student_ID, Class_ID)\nDependencies:\n- Student_ID -> Student_Name\n- Class_ID -> Class_Name",
      &["Student_Name depends only on part of the key", "Create separate tables for Students and Classes"],
    )],
  );
  bank
}

/// Canned question returned whenever AI generation fails. The caller never
/// sees a raw error; the contract guarantees a usable question.
pub fn fallback_question(topic: &str, difficulty: Difficulty) -> QuizQuestion {
  QuizQuestion {
    id: "fallback".into(),
    topic: topic.into(),
    difficulty,
    kind: QuestionKind::QueryWriting,
    source: QuestionSource::Fallback,
    question_text: "Explain the difference between RANK() and DENSE_RANK() using the Class of '26 schema.".into(),
    schema_context: "Table: Student_Scores (student_id, subject, score)".into(),
    hints: vec![
      "Think about gaps in ranking".into(),
      "Consider duplicate values".into(),
    ],
    options: None,
  }
}

/// Canned verdict returned whenever grading fails. Renderable as-is; the
/// score is never applied because is_correct is false.
pub fn ungraded_result() -> EvaluationResult {
  EvaluationResult {
    is_correct: false,
    score_awarded: 0.0,
    explanation: "Error connecting to grading server.".into(),
    correct_query: "SELECT 'Error';".into(),
    optimization_tip: "N/A".into(),
    user_feedback: "We could not grade your answer at this time.".into(),
    suggest_difficulty_increase: false,
  }
}

/// Markdown returned when theory generation fails.
pub const THEORY_ERROR: &str = "## Error loading content.";

/// Mock roster merged with the live profile on every leaderboard render.
pub fn mock_leaderboard() -> Vec<LeaderboardEntry> {
  let entry = |name: &str, score: u32, badges: &[&str]| LeaderboardEntry {
    name: name.into(),
    score,
    rank: 0,
    badges: badges.iter().map(|b| b.to_string()).collect(),
  };
  vec![
    entry("Alice_DBA", 2500, &["Query God"]),
    entry("Bob_Builder", 2100, &["Join Master"]),
    entry("Charlie_SQL", 1850, &[]),
    entry("Data_Diana", 1600, &["Window Wizard"]),
    entry("Index_Ian", 1200, &[]),
  ]
}

/// Pre-authored theory pages keyed by exact topic title. Served without any
/// AI call and never shadowed unless a forced refresh caches a newer copy.
pub fn static_theory() -> HashMap<&'static str, &'static str> {
  HashMap::from([
    ("Window Functions", WINDOW_FUNCTIONS_THEORY),
    ("Subqueries", SUBQUERIES_THEORY),
    ("Normalization", NORMALIZATION_THEORY),
    ("Advanced Modeling", MODELING_THEORY),
  ])
}

const WINDOW_FUNCTIONS_THEORY: &str = r#"
# Window Functions
Window functions operate on a set of rows and return a single value for each row from the underlying query. The term window describes the set of rows on which the function operates. A window function uses values from the rows in a window to calculate the returned values.

---

## 1. Key Concepts

- **Window**: The set of rows that the function operates on.
- **PARTITION BY**: Divides the result set into partitions (groups) to which the window function is applied.
- **ORDER BY**: Specifies the order of rows within each partition.
- **Frame**: A subset of rows within the partition (e.g., "current row and previous 2 rows").

> **Important**: Unlike `GROUP BY`, window functions do **not** reduce the number of rows returned by the query.

---

## 2. Syntax

```sql
SELECT
    column_name,
    WINDOW_FUNCTION(expression) OVER (
        [PARTITION BY partition_expression]
        [ORDER BY sort_expression]
        [frame_clause]
    ) AS alias_name
FROM table_name;
```

---

## 3. Ranking Functions

| Function | Description | Example (Scores: 10, 10, 20) |
| :--- | :--- | :--- |
| `ROW_NUMBER()` | Sequential integer unique to each row. | 1, 2, 3 |
| `RANK()` | Rank with gaps for ties. | 1, 1, 3 |
| `DENSE_RANK()` | Rank without gaps. | 1, 1, 2 |
| `NTILE(N)` | Distributes rows into N buckets. | 1, 1, 2 (if N=2) |

### Example Usage

```sql
SELECT
    student_name,
    score,
    RANK() OVER (ORDER BY score DESC) as rank_val,
    DENSE_RANK() OVER (ORDER BY score DESC) as dense_rank_val
FROM exam_results;
```

---

## 4. Value Functions

These functions allow you to access data from other rows in the window.

- **`LAG(col, n, default)`**: Returns value from `n` rows *before* current row.
- **`LEAD(col, n, default)`**: Returns value from `n` rows *after* current row.
- **`FIRST_VALUE(col)`**: Returns value from the first row in the window frame.
- **`LAST_VALUE(col)`**: Returns value from the last row in the window frame.

### Real-world Scenario: Year-over-Year Growth

```sql
SELECT
    Year,
    Revenue,
    LAG(Revenue, 1, 0) OVER (ORDER BY Year) as Previous_Year_Revenue,
    (Revenue - LAG(Revenue, 1, 0) OVER (ORDER BY Year)) as Growth
FROM Sales;
```

---

## 5. Frame Specifications

The frame clause refines the set of rows.

- **`ROWS`**: Physical rows (e.g., `ROWS BETWEEN 1 PRECEDING AND CURRENT ROW`).
- **`RANGE`**: Logical values (e.g., values within 10 units of current value).

**Keywords**:
- `UNBOUNDED PRECEDING`: Start of partition.
- `CURRENT ROW`: The row being evaluated.
- `UNBOUNDED FOLLOWING`: End of partition.

```sql
-- Running Total
SUM(amount) OVER (
    PARTITION BY department
    ORDER BY date
    ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW
)
```
"#;

const SUBQUERIES_THEORY: &str = r#"
# Subqueries (Nested Queries)
A subquery is a query nested inside another query such as `SELECT`, `INSERT`, `UPDATE`, or `DELETE`.

---

## 1. Types of Subqueries

| Type | Description | Where it can be used |
| :--- | :--- | :--- |
| **Scalar** | Returns a single value (one row, one column). | `SELECT` list, `WHERE` clause |
| **Row** | Returns a single row (multiple columns). | `WHERE` clause (tuple comparison) |
| **Table** | Returns a result set (multiple rows/cols). | `FROM` clause (Derived Table) |

---

## 2. Correlated Subqueries

A correlated subquery uses values from the outer query. It is evaluated **once for each row** processed by the outer query.

**Concept**: The inner query references a column from a table in the outer query (an "Outer Reference").

```sql
-- Find employees earning more than the average of THEIR department
SELECT e1.name, e1.salary, e1.dept_id
FROM employees e1
WHERE e1.salary > (
    SELECT AVG(e2.salary)
    FROM employees e2
    WHERE e2.dept_id = e1.dept_id -- Outer Reference
);
```

---

## 3. Existence Tests (`EXISTS`)

- **`EXISTS`**: Returns `TRUE` if the subquery returns **one or more rows**.
- It ignores the actual values returned (often used with `SELECT 1`).
- More efficient than `IN` for large datasets when checking existence.

```sql
-- Find customers who have placed at least one order
SELECT name
FROM customers c
WHERE EXISTS (
    SELECT 1 FROM orders o WHERE o.customer_id = c.id
);
```

---

## 4. Quantified Comparison (`ANY` / `ALL`)

- **`> ANY`**: Greater than *at least one* value in the subquery result (equivalent to `> MIN`).
- **`> ALL`**: Greater than *every* value in the subquery result (equivalent to `> MAX`).

> **Pitfall**: If the subquery returns a `NULL` value:
> - `ALL` comparisons will return unknown (effectively false).
> - `NOT IN` will return empty set if the list contains `NULL`.

```sql
-- Find products cheaper than ALL luxury products
SELECT name FROM products
WHERE price < ALL (
    SELECT price FROM products WHERE category = 'Luxury'
);
```
"#;

const NORMALIZATION_THEORY: &str = r#"
# Database Normalization
Normalization is the process of organizing data in a database. This includes creating tables and establishing relationships between those tables according to rules designed both to protect the data and to make the database more flexible by eliminating redundancy and inconsistent dependency.

---

## 1. The Anomalies (Why we normalize)

- **Insertion Anomaly**: Cannot insert data because other data is missing (e.g., cannot add a student without a class).
- **Deletion Anomaly**: Deleting data causes unintended loss of other data (e.g., deleting the last student in a class deletes the class info).
- **Update Anomaly**: Updating data in one place requires updating duplicates elsewhere.

---

## 2. Normal Forms

### First Normal Form (1NF)
- **Rules**:
  1. Table format (rows and columns).
  2. No repeating groups (atomic values).
  3. Primary Key (PK) identified.

### Second Normal Form (2NF)
- **Rules**:
  1. Must be in 1NF.
  2. **No Partial Dependencies**: All non-key attributes must depend on the *entire* primary key (only applies to composite PKs).

*Solution*: Split the table. Move columns dependent on only *part* of the key to a new table.

### Third Normal Form (3NF)
- **Rules**:
  1. Must be in 2NF.
  2. **No Transitive Dependencies**: Non-key attributes must not depend on other non-key attributes.

*Solution*: "Determinants should be Candidate Keys". Move the transitive attributes to a lookup table.

### Boyce-Codd Normal Form (BCNF)
- A special case of 3NF where **every determinant is a candidate key**.
- Addresses anomalies in tables with multiple overlapping candidate keys.

### Fourth Normal Form (4NF)
- **Rules**:
  1. Must be in BCNF.
  2. **No Multivalued Dependencies**: One key determines multiple independent attributes.

*Example*: A professor teaches multiple subjects AND advises multiple students. These two facts are independent and should be in separate tables to avoid Cartesian product rows.

---

## 3. Denormalization
Deliberately introducing redundancy (e.g., storing a calculated `total_price` column) to improve read performance at the cost of write performance and storage.
"#;

const MODELING_THEORY: &str = r#"
# Advanced Data Modeling (EER)
The Extended Entity Relationship (EER) model adds semantic concepts to the standard ER model to handle complex data requirements.

---

## 1. Supertype and Subtype

- **Supertype**: A generic entity type that has a relationship with one or more subtypes. (e.g., `Employee`).
- **Subtype**: A subgrouping of the supertype entities that has unique attributes. (e.g., `Pilot`, `Mechanic`).

> **Inheritance**: Subtypes inherit all attributes and relationships of their supertype.

---

## 2. Constraints

### Disjointness Constraints
- **Disjoint (d)**: An entity instance can be a member of **at most one** of the subtypes. (An employee cannot be both a Pilot and a Mechanic).
- **Overlapping (o)**: An entity instance can be a member of **multiple** subtypes. (A Person can be both an Employee and a Student).

### Completeness Constraints
- **Partial Completeness (Single Line)**: A supertype instance *does not have to* belong to any subtype. (An employee might be neither a pilot nor a mechanic, just general staff).
- **Total Completeness (Double Line)**: Every supertype instance *must* be a member of at least one subtype.

---

## 3. Entity Clustering
Grouping multiple entities and relationships into a single abstract entity to simplify the diagram for high-level viewing. This is purely a visual tool and does not affect the underlying schema.

---

## 4. Keys

- **Natural Key**: A key derived from the data itself (e.g., SSN, Email).
- **Surrogate Key**: A system-generated unique key (e.g., `id INT AUTO_INCREMENT`).
  - *Pros*: Immutable, faster joins, no security risk (unlike SSN).
  - *Cons*: Disconnected from real-world meaning.
"#;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn window_functions_bank_holds_the_two_fixed_questions() {
    let bank = static_questions();
    let wf = bank.get("window_functions").expect("window_functions entry");
    let ids: Vec<&str> = wf.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["wf_1", "wf_2"]);
    assert!(wf.iter().all(|q| q.source == QuestionSource::StaticBank));
  }

  #[test]
  fn data_modeling_has_no_bank_entry() {
    assert!(!static_questions().contains_key("data_modeling"));
  }

  #[test]
  fn fallback_question_is_renderable() {
    let q = fallback_question("window_functions", Difficulty::Expert);
    assert_eq!(q.id, "fallback");
    assert_eq!(q.source, QuestionSource::Fallback);
    assert_eq!(q.hints.len(), 2);
    assert!(q.question_text.contains("DENSE_RANK"));
  }

  #[test]
  fn ungraded_result_is_the_fixed_literal() {
    let r = ungraded_result();
    assert!(!r.is_correct);
    assert_eq!(r.score_awarded, 0.0);
    assert_eq!(r.explanation, "Error connecting to grading server.");
    assert_eq!(r.correct_query, "SELECT 'Error';");
    assert_eq!(r.optimization_tip, "N/A");
    assert_eq!(r.user_feedback, "We could not grade your answer at this time.");
    assert!(!r.suggest_difficulty_increase);
  }

  #[test]
  fn static_theory_covers_every_catalog_title() {
    let theory = static_theory();
    for t in crate::curriculum::TOPICS {
      assert!(theory.contains_key(t.title), "missing theory for {}", t.title);
    }
  }
}
