use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use client_core::{
    permissions::{self, Permission, Section},
    wizard::{AttendanceMark, Selection},
    DeleteTarget, Dispatcher, Wizard, WizardMove,
};
use serde::Serialize;
use shared::{
    domain::{
        AttendanceStatus, ClassId, LessonId, ModuleId, NewsId, RegistrationId, RegistrationStatus,
        ResourceKind, StudentId,
    },
    protocol::RegistrationStatusUpdate,
};
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Navigation sections visible to the configured role.
    Sections,
    Classes,
    Students {
        #[arg(long)]
        class: Option<String>,
    },
    Modules {
        #[arg(long)]
        class: Option<String>,
    },
    Lessons {
        #[arg(long)]
        module: Option<String>,
    },
    Attendance {
        #[command(subcommand)]
        command: AttendanceCommand,
    },
    /// Grades one student for one lesson (score between 0 and 20).
    Evaluate(EvaluateArgs),
    News {
        #[command(subcommand)]
        command: NewsCommand,
    },
    Registrations {
        #[arg(long)]
        pending: bool,
        #[command(subcommand)]
        command: Option<RegistrationsCommand>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AttendanceCommand {
    List {
        #[arg(long)]
        lesson: String,
    },
    Record(RecordAttendanceArgs),
}

#[derive(Args, Debug)]
pub struct RecordAttendanceArgs {
    #[arg(long)]
    pub class: String,
    #[arg(long)]
    pub module: String,
    #[arg(long)]
    pub lesson: String,
    #[arg(long = "student", required = true)]
    pub students: Vec<String>,
    #[arg(long)]
    pub status: AttendanceStatus,
    #[arg(long, default_value = "")]
    pub note: String,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub class: String,
    #[arg(long)]
    pub student: String,
    #[arg(long)]
    pub module: String,
    #[arg(long)]
    pub lesson: String,
    #[arg(long)]
    pub score: f32,
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum NewsCommand {
    List,
    Delete {
        id: String,
        /// Confirms the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RegistrationsCommand {
    Review {
        id: String,
        #[arg(long)]
        status: RegistrationStatus,
        #[arg(long, default_value = "")]
        note: String,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

impl Command {
    /// What the configured role must be allowed to do before anything is sent.
    pub fn permission(&self) -> Option<Permission> {
        Some(match self {
            Self::Sections => return None,
            Self::Classes => Permission::View(Section::Classes),
            Self::Students { .. } => Permission::View(Section::Students),
            Self::Modules { .. } => Permission::View(Section::Modules),
            Self::Lessons { .. } => Permission::View(Section::Lessons),
            Self::Attendance {
                command: AttendanceCommand::List { .. },
            } => Permission::View(Section::Attendance),
            Self::Attendance {
                command: AttendanceCommand::Record(_),
            } => Permission::Create(ResourceKind::Attendance),
            Self::Evaluate(_) => Permission::Create(ResourceKind::Evaluation),
            Self::News {
                command: NewsCommand::List,
            } => Permission::View(Section::News),
            Self::News {
                command: NewsCommand::Delete { .. },
            } => Permission::Delete(ResourceKind::News),
            Self::Registrations { command: None, .. } => Permission::View(Section::Registrations),
            Self::Registrations {
                command: Some(RegistrationsCommand::Review { .. }),
                ..
            } => Permission::ReviewRegistrations,
            Self::Registrations {
                command: Some(RegistrationsCommand::Delete { .. }),
                ..
            } => Permission::Delete(ResourceKind::Registration),
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(dispatcher: &Arc<Dispatcher>, command: Command) -> Result<()> {
    match command {
        Command::Sections => {
            let sections: Vec<String> = permissions::visible_sections(dispatcher.role())
                .into_iter()
                .map(|section| format!("{section:?}"))
                .collect();
            print_json(&sections)
        }
        Command::Classes => print_json(&dispatcher.fetch_classes().await?),
        Command::Students { class } => {
            print_json(&dispatcher.fetch_students(class.map(ClassId::from)).await?)
        }
        Command::Modules { class } => {
            print_json(&dispatcher.fetch_modules(class.map(ClassId::from)).await?)
        }
        Command::Lessons { module } => {
            print_json(&dispatcher.fetch_lessons(module.map(ModuleId::from)).await?)
        }
        Command::Attendance {
            command: AttendanceCommand::List { lesson },
        } => print_json(&dispatcher.fetch_attendances(LessonId::from(lesson)).await?),
        Command::Attendance {
            command: AttendanceCommand::Record(args),
        } => record_attendance(dispatcher, args).await,
        Command::Evaluate(args) => evaluate(dispatcher, args).await,
        Command::News {
            command: NewsCommand::List,
        } => print_json(&dispatcher.fetch_news().await?),
        Command::News {
            command: NewsCommand::Delete { id, yes },
        } => confirm_and_delete(dispatcher, DeleteTarget::new(ResourceKind::News, id), yes).await,
        Command::Registrations {
            pending,
            command: None,
        } => {
            let registrations = if pending {
                dispatcher.fetch_pending_registrations().await?
            } else {
                dispatcher.fetch_registrations().await?
            };
            print_json(&registrations)
        }
        Command::Registrations {
            command: Some(RegistrationsCommand::Review { id, status, note }),
            ..
        } => {
            let updated = dispatcher
                .update_registration_status(
                    RegistrationId::from(id),
                    RegistrationStatusUpdate { status, note },
                )
                .await?;
            print_json(&updated)
        }
        Command::Registrations {
            command: Some(RegistrationsCommand::Delete { id, yes }),
            ..
        } => {
            let target = DeleteTarget::new(ResourceKind::Registration, id);
            confirm_and_delete(dispatcher, target, yes).await
        }
    }
}

async fn confirm_and_delete(
    dispatcher: &Arc<Dispatcher>,
    target: DeleteTarget,
    confirmed: bool,
) -> Result<()> {
    dispatcher.request_delete(target.clone()).await?;
    if !confirmed {
        dispatcher.close_modal().await;
        bail!(
            "refusing to delete {} {} without --yes",
            target.resource,
            target.id
        );
    }
    dispatcher.confirm_delete().await?;
    info!(resource = %target.resource, id = %target.id, "cli: deleted");
    Ok(())
}

/// Loads the options a wizard step asks for.
async fn enter(dispatcher: &Arc<Dispatcher>, moved: WizardMove) -> Result<()> {
    if let WizardMove::Entered {
        load: Some(request),
        ..
    } = moved
    {
        dispatcher.load_options(request).await?;
    }
    Ok(())
}

async fn select_class(
    dispatcher: &Arc<Dispatcher>,
    wizard: &mut Wizard,
    id: String,
) -> Result<()> {
    dispatcher.load_options(wizard.start()).await?;
    let class = ClassId::from(id);
    let known = dispatcher
        .store()
        .read(|store| store.classes.contains(&class))
        .await;
    if !known {
        bail!("unknown class {class}");
    }
    enter(dispatcher, wizard.select(Selection::Class(class))?).await
}

async fn select_module(
    dispatcher: &Arc<Dispatcher>,
    wizard: &mut Wizard,
    id: String,
) -> Result<()> {
    let module = ModuleId::from(id);
    let known = dispatcher
        .store()
        .read(|store| {
            wizard
                .modules_for(store.modules.items())
                .iter()
                .any(|m| m.id == module)
        })
        .await;
    if !known {
        bail!("module {module} does not belong to the selected class");
    }
    enter(dispatcher, wizard.select(Selection::Module(module))?).await
}

async fn select_lesson(
    dispatcher: &Arc<Dispatcher>,
    wizard: &mut Wizard,
    id: String,
) -> Result<()> {
    let lesson = LessonId::from(id);
    let known = dispatcher
        .store()
        .read(|store| {
            wizard
                .lessons_for(store.lessons.items())
                .iter()
                .any(|l| l.id == lesson)
        })
        .await;
    if !known {
        bail!("lesson {lesson} does not belong to the selected module");
    }
    enter(dispatcher, wizard.select(Selection::Lesson(lesson))?).await
}

async fn ensure_in_class(
    dispatcher: &Arc<Dispatcher>,
    wizard: &Wizard,
    student: &StudentId,
) -> Result<()> {
    let known = dispatcher
        .store()
        .read(|store| {
            wizard
                .students_for(store.students.items())
                .iter()
                .any(|s| &s.id == student)
        })
        .await;
    if !known {
        bail!("student {student} is not enrolled in the selected class");
    }
    Ok(())
}

async fn record_attendance(
    dispatcher: &Arc<Dispatcher>,
    args: RecordAttendanceArgs,
) -> Result<()> {
    let mut wizard = Wizard::attendance();
    select_class(dispatcher, &mut wizard, args.class).await?;
    select_module(dispatcher, &mut wizard, args.module).await?;
    select_lesson(dispatcher, &mut wizard, args.lesson).await?;

    let mut marks = Vec::with_capacity(args.students.len());
    for student in args.students {
        let student = StudentId::from(student);
        ensure_in_class(dispatcher, &wizard, &student).await?;
        marks.push(AttendanceMark {
            student,
            status: args.status,
            note: args.note.clone(),
        });
    }

    let created = dispatcher
        .submit_attendance(&wizard, marks)
        .await
        .context("recording attendance")?;
    print_json(&created)
}

async fn evaluate(dispatcher: &Arc<Dispatcher>, args: EvaluateArgs) -> Result<()> {
    let mut wizard = Wizard::evaluation();
    select_class(dispatcher, &mut wizard, args.class).await?;

    let student = StudentId::from(args.student);
    ensure_in_class(dispatcher, &wizard, &student).await?;
    enter(dispatcher, wizard.select(Selection::Student(student))?).await?;

    select_module(dispatcher, &mut wizard, args.module).await?;
    select_lesson(dispatcher, &mut wizard, args.lesson).await?;

    let created = dispatcher
        .submit_evaluation(&wizard, args.score, args.comment)
        .await
        .context("saving evaluation")?;
    print_json(&created)
}
