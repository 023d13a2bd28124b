use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Vacancy {
    pub id: i32,
    pub name: String,
    pub company: String,
    pub salary_from: Option<i32>,
    pub salary_to: Option<i32>,
    pub currency: Option<String>,
    pub url: Option<String>,
    pub region_id: Option<i32>,
    pub region: Option<String>,
    pub experience: Option<String>,
    pub employment: Option<String>,
}

/// A vacancy mapped from the job board, not yet persisted.
/// Length limits mirror the column widths of the `vacancies` table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Validate)]
pub struct NewVacancy {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub company: String,
    pub salary_from: Option<i32>,
    pub salary_to: Option<i32>,
    #[validate(length(max = 10))]
    pub currency: Option<String>,
    #[validate(length(min = 1))]
    pub url: String,
    pub region_id: Option<i32>,
    #[validate(length(max = 255))]
    pub region: Option<String>,
    #[validate(length(max = 255))]
    pub experience: Option<String>,
    #[validate(length(max = 255))]
    pub employment: Option<String>,
}

impl NewVacancy {
    pub fn into_vacancy(self, id: i32) -> Vacancy {
        Vacancy {
            id,
            name: self.name,
            company: self.company,
            salary_from: self.salary_from,
            salary_to: self.salary_to,
            currency: self.currency,
            url: Some(self.url),
            region_id: self.region_id,
            region: self.region,
            experience: self.experience,
            employment: self.employment,
        }
    }
}
