#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};
    use tickethours::db::tickets::Tickets;
    use tickethours::db::time_entries::TimeEntries;
    use tickethours::libs::data_storage::DataStorage;
    use tickethours::libs::entry::{EntryFilter, NewTimeEntry, TicketSelector};
    use tickethours::libs::env::Env;
    use tickethours::libs::error::HoursError;
    use tickethours::libs::hours::Hours;
    use tickethours::libs::messages::Message;
    use tickethours::libs::permission::{Capability, Permissions};
    use tickethours::libs::ticket::{NewTicket, Ticket, ESTIMATED_HOURS, TOTAL_HOURS};
    use tickethours::web::component::ComponentManager;
    use tickethours::web::page::HostPage;
    use tickethours::web::request::Request;
    use tickethours::web::ticket_change::TicketChange;

    struct TrackerContext {
        _temp_dir: TempDir,
        env: Env,
        manager: ComponentManager,
    }

    impl TestContext for TrackerContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let env = Env::open(&DataStorage::at(temp_dir.path())).unwrap();
            TrackerContext {
                _temp_dir: temp_dir,
                env,
                manager: ComponentManager::new(),
            }
        }
    }

    impl TrackerContext {
        fn ticket(&mut self, summary: &str) -> Ticket {
            self.manager.create_ticket(&mut self.env, &NewTicket::new(summary, "joe")).unwrap()
        }

        fn reload(&self, id: i64) -> Ticket {
            Tickets::new(&self.env.db.conn).require(id).unwrap()
        }

        fn entry_seconds(&self, id: i64) -> Vec<i64> {
            let mut seconds: Vec<i64> = TimeEntries::new(&self.env.db.conn)
                .fetch(&EntryFilter::new(id))
                .unwrap()
                .iter()
                .map(|e| e.seconds_worked)
                .collect();
            seconds.sort();
            seconds
        }
    }

    fn member() -> Permissions {
        Permissions::new([Capability::TicketView, Capability::TicketViewHours, Capability::TicketAddHours])
    }

    #[test_context(TrackerContext)]
    #[test]
    fn new_tickets_start_with_zero_hours(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Set up CI");

        assert_eq!(ticket.custom[TOTAL_HOURS], "0");
        assert_eq!(ticket.custom[ESTIMATED_HOURS], "0");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn recorded_work_reads_back_unchanged(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Write docs");
        let started = Utc::now() - Duration::days(2);

        let recorded = Hours::new(&mut ctx.env.db)
            .record_work(
                NewTimeEntry::new(ticket.id, "ann", 2700)
                    .submitter(Some("joe"))
                    .started(Some(started))
                    .comments(Some("outline and intro")),
            )
            .unwrap();

        let fetched = TimeEntries::new(&ctx.env.db.conn).fetch(&EntryFilter::new(ticket.id)).unwrap();
        assert_eq!(fetched, vec![recorded.clone()]);
        assert_eq!(recorded.submitter, "joe");
        assert_eq!(recorded.time_started.timestamp(), started.timestamp());
        assert_eq!(recorded.comments, "outline and intro");
        assert_eq!(ctx.reload(ticket.id).custom[TOTAL_HOURS], "0.75");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn hours_form_records_entry_and_comment(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Fix login");
        let path = format!("/hours/{}", ticket.id);

        let req = Request::post(&path)
            .user(Some("joe"), member())
            .arg("addhours", "1")
            .arg("hours", "1:30")
            .arg("comments", "  fixed the form  ");
        let response = ctx.manager.dispatch(&mut ctx.env, &req).unwrap();

        assert_eq!(response.location(), Some(path.as_str()));
        assert!(response.warnings.is_empty());

        let entries = TimeEntries::new(&ctx.env.db.conn).fetch(&EntryFilter::new(ticket.id)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].worker, "joe");
        assert_eq!(entries[0].submitter, "joe");
        assert_eq!(entries[0].seconds_worked, 5400);
        assert_eq!(entries[0].comments, "fixed the form");
        assert_eq!(ctx.reload(ticket.id).custom[TOTAL_HOURS], "1.50");

        let comments = Tickets::new(&ctx.env.db.conn).comments(ticket.id).unwrap();
        let note = &comments.last().unwrap().text;
        assert!(note.starts_with(&format!("[/hours/{} 1.50\thours]", ticket.id)));
        assert!(note.contains("fixed\tthe\tform"));
    }

    #[test_context(TrackerContext)]
    #[test]
    fn invalid_hours_warn_without_writing(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Fix login");

        let req = Request::post(&format!("/hours/{}", ticket.id))
            .user(Some("joe"), member())
            .arg("addhours", "1")
            .arg("hours", "1:75");
        let response = ctx.manager.dispatch(&mut ctx.env, &req).unwrap();

        assert_eq!(response.warnings, vec![Message::InvalidHours]);
        assert!(ctx.entry_seconds(ticket.id).is_empty());
        assert!(Tickets::new(&ctx.env.db.conn).comments(ticket.id).unwrap().is_empty());
    }

    #[test_context(TrackerContext)]
    #[test]
    fn invalid_date_warns_without_writing(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Fix login");
        let path = format!("/hours/{}", ticket.id);

        let req = Request::post(&path)
            .user(Some("joe"), member())
            .arg("addhours", "1")
            .arg("hours", "1:00")
            .arg("date", "2024-13-45");
        let response = ctx.manager.dispatch(&mut ctx.env, &req).unwrap();
        assert_eq!(response.warnings, vec![Message::InvalidDate("2024-13-45".to_string())]);
        assert_eq!(response.location(), Some(path.as_str()));

        let req = Request::post(&path)
            .user(Some("joe"), member())
            .arg("addhours", "1")
            .arg("hours", "99999999999999999:00");
        let response = ctx.manager.dispatch(&mut ctx.env, &req).unwrap();
        assert_eq!(response.warnings, vec![Message::InvalidHours]);

        assert!(ctx.entry_seconds(ticket.id).is_empty());
        assert!(Tickets::new(&ctx.env.db.conn).comments(ticket.id).unwrap().is_empty());
    }

    #[test_context(TrackerContext)]
    #[test]
    fn logging_for_another_worker_needs_ticket_admin(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Fix login");
        let path = format!("/hours/{}", ticket.id);
        let for_ann = |perm: Permissions| {
            Request::post(&path)
                .user(Some("joe"), perm)
                .arg("addhours", "1")
                .arg("hours", "2:00")
                .arg("worker", "ann")
        };

        let denied = ctx.manager.dispatch(&mut ctx.env, &for_ann(member()));
        assert!(matches!(denied, Err(HoursError::PermissionDenied(Capability::TicketAdmin))));
        assert!(ctx.entry_seconds(ticket.id).is_empty());

        let admin = Permissions::new([Capability::TicketView, Capability::TicketAdmin]);
        ctx.manager.dispatch(&mut ctx.env, &for_ann(admin)).unwrap();

        let entries = TimeEntries::new(&ctx.env.db.conn).fetch(&EntryFilter::new(ticket.id)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].worker, "ann");
        assert_eq!(entries[0].submitter, "joe");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn anonymous_callers_cannot_log_hours(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Fix login");
        let perm = ctx.env.config.permissions_for(None);

        let req = Request::post(&format!("/hours/{}", ticket.id))
            .user(None, perm)
            .arg("addhours", "1")
            .arg("hours", "1:00");
        let result = ctx.manager.dispatch(&mut ctx.env, &req);

        assert!(matches!(result, Err(HoursError::PermissionDenied(Capability::TicketAddHours))));
    }

    #[test_context(TrackerContext)]
    #[test]
    fn edits_and_removals_keep_total_in_sync(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Refactor");
        let (first, second) = {
            let mut hours = Hours::new(&mut ctx.env.db);
            let first = hours.record_work(NewTimeEntry::new(ticket.id, "joe", 3600)).unwrap();
            let second = hours.record_work(NewTimeEntry::new(ticket.id, "joe", 1800)).unwrap();
            (first.id, second.id)
        };
        assert_eq!(ctx.reload(ticket.id).custom[TOTAL_HOURS], "1.50");

        let req = Request::post(&format!("/hours/{}", ticket.id))
            .user(Some("joe"), member())
            .arg("edithours", "1")
            .arg(&format!("hours_{}", first), "2:15")
            .arg(&format!("rm_{}", second), "on");
        ctx.manager.dispatch(&mut ctx.env, &req).unwrap();

        assert_eq!(ctx.entry_seconds(ticket.id), vec![8100]);
        assert_eq!(ctx.reload(ticket.id).custom[TOTAL_HOURS], "2.25");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn editing_someone_elses_entry_needs_trac_admin(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Refactor");
        let entry = Hours::new(&mut ctx.env.db)
            .record_work(NewTimeEntry::new(ticket.id, "ann", 3600))
            .unwrap();

        let req = Request::post(&format!("/hours/{}", ticket.id))
            .user(Some("joe"), member())
            .arg("edithours", "1")
            .arg(&format!("rm_{}", entry.id), "on");
        let result = ctx.manager.dispatch(&mut ctx.env, &req);

        assert!(matches!(result, Err(HoursError::PermissionDenied(Capability::TracAdmin))));
        assert_eq!(ctx.entry_seconds(ticket.id), vec![3600]);
        assert_eq!(ctx.reload(ticket.id).custom[TOTAL_HOURS], "1.00");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn comment_phrases_become_linked_entries(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Investigate crash");
        let req = Request::post("/ticket").user(Some("joe"), member());

        let change = TicketChange::new(ticket.clone(), "joe").comment("worked 1.5 hours and then 1 hour");
        let problems = ctx.manager.save_ticket_change(&mut ctx.env, &req, change).unwrap();
        assert!(problems.is_empty());

        let comments = Tickets::new(&ctx.env.db.conn).comments(ticket.id).unwrap();
        assert_eq!(
            comments.last().unwrap().text,
            format!("worked [/hours/{0} 1.5 hours] and then [/hours/{0} 1 hour]", ticket.id)
        );

        let entries = TimeEntries::new(&ctx.env.db.conn).fetch(&EntryFilter::new(ticket.id)).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.comments == "worked 1.5 hours and then 1 hour"));
        assert!(entries.iter().all(|e| e.worker == "joe"));
        assert_eq!(ctx.entry_seconds(ticket.id), vec![3600, 5400]);
        assert_eq!(ctx.reload(ticket.id).custom[TOTAL_HOURS], "2.50");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn anonymous_comments_log_nothing(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Investigate crash");
        let perm = ctx.env.config.permissions_for(None);
        let req = Request::post("/ticket").user(None, perm);

        let change = TicketChange::new(ticket.clone(), "anonymous").comment("took 2 hours");
        ctx.manager.save_ticket_change(&mut ctx.env, &req, change).unwrap();

        let comments = Tickets::new(&ctx.env.db.conn).comments(ticket.id).unwrap();
        assert_eq!(comments.last().unwrap().text, "took 2 hours");
        assert!(ctx.entry_seconds(ticket.id).is_empty());
    }

    #[test_context(TrackerContext)]
    #[test]
    fn estimates_are_validated_before_saving(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Estimate me");
        let req = Request::post("/ticket").user(Some("joe"), member());
        let field = Some(ESTIMATED_HOURS.to_string());

        let change = TicketChange::new(ticket.clone(), "joe").set(ESTIMATED_HOURS, "soon").comment("2 hours");
        let problems = ctx.manager.save_ticket_change(&mut ctx.env, &req, change).unwrap();
        assert_eq!(problems, vec![(field.clone(), Message::EstimatedHoursNotANumber)]);
        assert!(ctx.entry_seconds(ticket.id).is_empty());
        assert!(Tickets::new(&ctx.env.db.conn).comments(ticket.id).unwrap().is_empty());

        let change = TicketChange::new(ticket.clone(), "joe").set(ESTIMATED_HOURS, "-1");
        let problems = ctx.manager.save_ticket_change(&mut ctx.env, &req, change).unwrap();
        assert_eq!(problems, vec![(field, Message::EstimatedHoursNegative)]);
        assert_eq!(ctx.reload(ticket.id).custom[ESTIMATED_HOURS], "0");

        let change = TicketChange::new(ticket.clone(), "joe").set(ESTIMATED_HOURS, "2.5");
        assert!(ctx.manager.save_ticket_change(&mut ctx.env, &req, change).unwrap().is_empty());
        let ticket = ctx.reload(ticket.id);
        assert_eq!(ticket.custom[ESTIMATED_HOURS], "2.5");

        let change = TicketChange::new(ticket.clone(), "joe").set(ESTIMATED_HOURS, "  ");
        assert!(ctx.manager.save_ticket_change(&mut ctx.env, &req, change).unwrap().is_empty());
        assert_eq!(ctx.reload(ticket.id).custom[ESTIMATED_HOURS], "0");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn deleting_a_ticket_removes_its_hours(ctx: &mut TrackerContext) {
        let doomed = ctx.ticket("Doomed");
        let kept = ctx.ticket("Kept");
        {
            let mut hours = Hours::new(&mut ctx.env.db);
            hours.record_work(NewTimeEntry::new(doomed.id, "joe", 3600)).unwrap();
            hours.record_work(NewTimeEntry::new(doomed.id, "ann", 7200)).unwrap();
            hours.record_work(NewTimeEntry::new(kept.id, "joe", 900)).unwrap();
        }

        ctx.manager.delete_ticket(&mut ctx.env, doomed.id).unwrap();

        let remaining = TimeEntries::new(&ctx.env.db.conn)
            .fetch(&EntryFilter::new(TicketSelector::All))
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].ticket, kept.id);
        assert!(Tickets::new(&ctx.env.db.conn).get(doomed.id).unwrap().is_none());
        assert_eq!(ctx.reload(kept.id).custom[TOTAL_HOURS], "0.25");
    }

    #[test_context(TrackerContext)]
    #[test]
    fn ticket_page_links_total_hours(ctx: &mut TrackerContext) {
        let parent = ctx.ticket("Epic");
        let child = ctx.ticket("Story");
        Tickets::new(&ctx.env.db.conn).add_child(parent.id, child.id).unwrap();
        {
            let mut hours = Hours::new(&mut ctx.env.db);
            hours.record_work(NewTimeEntry::new(parent.id, "joe", 3600)).unwrap();
            hours.record_work(NewTimeEntry::new(child.id, "joe", 1800)).unwrap();
        }
        ctx.env.config.relations = true;
        let req = Request::get(&format!("/ticket/{}", parent.id)).user(Some("joe"), member());

        let mut page = HostPage::Ticket {
            ticket: Some(ctx.reload(parent.id)),
            total_hours: None,
        };
        ctx.manager.filter_page(&mut ctx.env, &req, &mut page).unwrap();

        let HostPage::Ticket { total_hours: Some(field), .. } = page else {
            panic!("ticket page lost its hours field");
        };
        assert_eq!(field.hours, "1.00");
        assert_eq!(field.href, format!("/hours/{}", parent.id));
        assert_eq!(field.with_children.as_deref(), Some("1.50"));
    }

    #[test_context(TrackerContext)]
    #[test]
    fn hours_pages_need_view_hours(ctx: &mut TrackerContext) {
        let ticket = ctx.ticket("Secret");
        let req = Request::get(&format!("/hours/{}", ticket.id)).user(Some("joe"), Permissions::new([Capability::TicketView]));

        let result = ctx.manager.dispatch(&mut ctx.env, &req);

        assert!(matches!(result, Err(HoursError::PermissionDenied(Capability::TicketViewHours))));
    }
}
