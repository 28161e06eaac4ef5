//! Linear selection flows ending in a submission form.
//!
//! Evaluation flow: class → student → module → lesson → form.
//! Attendance flow: class → module → lesson → form, where the form marks every
//! student of the selected class.
//!
//! Every selection goes through [`Wizard::select`], which clears every later
//! selection so a child can never outlive its parent.

use shared::{
    domain::{AttendanceStatus, ClassId, LessonId, ModuleId, StudentId},
    protocol::{LessonSummary, ModuleSummary, NewAttendance, NewEvaluation, StudentSummary},
};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Class,
    Student,
    Module,
    Lesson,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Attendance,
    Evaluation,
}

impl FlowKind {
    /// List steps in order; the form follows the last one.
    pub fn steps(self) -> &'static [Step] {
        match self {
            Self::Attendance => &[Step::Class, Step::Module, Step::Lesson],
            Self::Evaluation => &[Step::Class, Step::Student, Step::Module, Step::Lesson],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Class(ClassId),
    Student(StudentId),
    Module(ModuleId),
    Lesson(LessonId),
}

impl Selection {
    pub fn step(&self) -> Step {
        match self {
            Self::Class(_) => Step::Class,
            Self::Student(_) => Step::Student,
            Self::Module(_) => Step::Module,
            Self::Lesson(_) => Step::Lesson,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub class: Option<ClassId>,
    pub student: Option<StudentId>,
    pub module: Option<ModuleId>,
    pub lesson: Option<LessonId>,
}

impl Selections {
    fn is_set(&self, step: Step) -> bool {
        match step {
            Step::Class => self.class.is_some(),
            Step::Student => self.student.is_some(),
            Step::Module => self.module.is_some(),
            Step::Lesson => self.lesson.is_some(),
            Step::Form => true,
        }
    }

    fn clear(&mut self, step: Step) {
        match step {
            Step::Class => self.class = None,
            Step::Student => self.student = None,
            Step::Module => self.module = None,
            Step::Lesson => self.lesson = None,
            Step::Form => {}
        }
    }

    fn set(&mut self, selection: Selection) {
        match selection {
            Selection::Class(id) => self.class = Some(id),
            Selection::Student(id) => self.student = Some(id),
            Selection::Module(id) => self.module = Some(id),
            Selection::Lesson(id) => self.lesson = Some(id),
        }
    }
}

/// Data the caller has to load for the step just entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsRequest {
    Classes,
    StudentsOfClass(ClassId),
    ModulesOfClass(ClassId),
    LessonsOfModule(ModuleId),
    AttendanceSheet { class: ClassId, lesson: LessonId },
    EvaluationsOfLesson(LessonId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardMove {
    Entered {
        step: Step,
        load: Option<OptionsRequest>,
    },
    /// Back from the first step; the caller navigates away.
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    pub student: StudentId,
    pub status: AttendanceStatus,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    kind: FlowKind,
    cursor: usize,
    selections: Selections,
}

impl Wizard {
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            cursor: 0,
            selections: Selections::default(),
        }
    }

    pub fn attendance() -> Self {
        Self::new(FlowKind::Attendance)
    }

    pub fn evaluation() -> Self {
        Self::new(FlowKind::Evaluation)
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn current_step(&self) -> Step {
        self.kind
            .steps()
            .get(self.cursor)
            .copied()
            .unwrap_or(Step::Form)
    }

    pub fn start(&self) -> OptionsRequest {
        OptionsRequest::Classes
    }

    /// Sets the selection for its step, clears every later step and advances.
    pub fn select(&mut self, selection: Selection) -> ClientResult<WizardMove> {
        let steps = self.kind.steps();
        let step = selection.step();
        let Some(index) = steps.iter().position(|s| *s == step) else {
            return Err(ClientError::validation(format!(
                "{step:?} is not part of the {:?} flow",
                self.kind
            )));
        };
        if let Some(missing) = steps[..index]
            .iter()
            .find(|ancestor| !self.selections.is_set(**ancestor))
        {
            return Err(ClientError::validation(format!(
                "select a {missing:?} before a {step:?}"
            )));
        }

        self.selections.set(selection);
        for later in &steps[index + 1..] {
            self.selections.clear(*later);
        }
        self.cursor = index + 1;

        let entered = self.current_step();
        Ok(WizardMove::Entered {
            step: entered,
            load: self.load_for(entered),
        })
    }

    pub fn back(&mut self) -> WizardMove {
        let steps = self.kind.steps();
        if self.cursor >= steps.len() {
            self.cursor = steps.len() - 1;
            return WizardMove::Entered {
                step: self.current_step(),
                load: None,
            };
        }
        if self.cursor == 0 {
            self.selections = Selections::default();
            return WizardMove::Exit;
        }
        for step in &steps[self.cursor..] {
            self.selections.clear(*step);
        }
        self.cursor -= 1;
        WizardMove::Entered {
            step: self.current_step(),
            load: None,
        }
    }

    fn load_for(&self, step: Step) -> Option<OptionsRequest> {
        let s = &self.selections;
        match step {
            Step::Class => Some(OptionsRequest::Classes),
            Step::Student => s.class.clone().map(OptionsRequest::StudentsOfClass),
            Step::Module => s.class.clone().map(OptionsRequest::ModulesOfClass),
            Step::Lesson => s.module.clone().map(OptionsRequest::LessonsOfModule),
            Step::Form => match self.kind {
                FlowKind::Attendance => match (s.class.clone(), s.lesson.clone()) {
                    (Some(class), Some(lesson)) => {
                        Some(OptionsRequest::AttendanceSheet { class, lesson })
                    }
                    _ => None,
                },
                FlowKind::Evaluation => s.lesson.clone().map(OptionsRequest::EvaluationsOfLesson),
            },
        }
    }

    /// Students of the selected class; empty while no class is selected.
    pub fn students_for<'a>(&self, students: &'a [StudentSummary]) -> Vec<&'a StudentSummary> {
        let Some(class) = &self.selections.class else {
            return Vec::new();
        };
        students
            .iter()
            .filter(|student| student.class_id.as_ref() == Some(class))
            .collect()
    }

    pub fn modules_for<'a>(&self, modules: &'a [ModuleSummary]) -> Vec<&'a ModuleSummary> {
        let Some(class) = &self.selections.class else {
            return Vec::new();
        };
        modules
            .iter()
            .filter(|module| module.class_id.as_ref() == Some(class))
            .collect()
    }

    pub fn lessons_for<'a>(&self, lessons: &'a [LessonSummary]) -> Vec<&'a LessonSummary> {
        let Some(module) = &self.selections.module else {
            return Vec::new();
        };
        lessons
            .iter()
            .filter(|lesson| &lesson.module_id == module)
            .collect()
    }

    fn required<T: Clone>(&self, value: &Option<T>, step: Step) -> ClientResult<T> {
        value
            .clone()
            .ok_or_else(|| ClientError::validation(format!("missing {step:?} selection")))
    }

    pub fn evaluation_submission(
        &self,
        score: f32,
        comment: Option<String>,
    ) -> ClientResult<NewEvaluation> {
        if self.kind != FlowKind::Evaluation {
            return Err(ClientError::validation("not an evaluation flow"));
        }
        let s = &self.selections;
        self.required(&s.class, Step::Class)?;
        let evaluation = NewEvaluation {
            student: self.required(&s.student, Step::Student)?,
            module: self.required(&s.module, Step::Module)?,
            lesson: self.required(&s.lesson, Step::Lesson)?,
            score,
            comment: comment.filter(|c| !c.trim().is_empty()),
        };
        evaluation.validate()?;
        Ok(evaluation)
    }

    pub fn attendance_submission(
        &self,
        marks: Vec<AttendanceMark>,
    ) -> ClientResult<Vec<NewAttendance>> {
        if self.kind != FlowKind::Attendance {
            return Err(ClientError::validation("not an attendance flow"));
        }
        let s = &self.selections;
        self.required(&s.class, Step::Class)?;
        self.required(&s.module, Step::Module)?;
        let lesson = self.required(&s.lesson, Step::Lesson)?;
        if marks.is_empty() {
            return Err(ClientError::validation("no attendance marks to submit"));
        }
        Ok(marks
            .into_iter()
            .map(|mark| NewAttendance {
                student: mark.student,
                lesson: lesson.clone(),
                status: mark.status,
                note: mark.note,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
